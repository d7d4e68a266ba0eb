//! Order Orchestrator
//!
//! `OrderService` is the composition root: it resolves referenced
//! entities, prices the cart, persists the order, reconciles inventory,
//! enforces the status state machine per actor role, and drives the
//! notification side effects of every transition.

use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use shared::models::{
    Actor, ActorRole, CreateOrderInput, Order, OrderItem, OrderStatus, PaymentInfo, PaymentStatus,
    PaymentUpdate, PayoutStatus, Seller, SellerStatus, StatusHistoryEntry, User,
};
use shared::{MarketError, MarketResult};

use crate::config::PricingConfig;
use crate::money;
use crate::notify::{self, NotificationDispatcher, NotifyContext, OrderEvent};
use crate::pricing;
use crate::status;
use crate::stores::{CatalogStore, ListOptions, OrderFilters, OrderStats, OrderStore, PartyStore};

/// Attempts at drawing an unused order number before giving up
const ORDER_NUMBER_ATTEMPTS: usize = 8;

/// Default currency for orders that do not specify one
const DEFAULT_CURRENCY: &str = "INR";

/// Order lifecycle orchestrator
#[derive(Clone)]
pub struct OrderService {
    orders: Arc<dyn OrderStore>,
    catalog: Arc<dyn CatalogStore>,
    parties: Arc<dyn PartyStore>,
    dispatcher: NotificationDispatcher,
    config: PricingConfig,
}

impl OrderService {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        catalog: Arc<dyn CatalogStore>,
        parties: Arc<dyn PartyStore>,
        dispatcher: NotificationDispatcher,
        config: PricingConfig,
    ) -> Self {
        Self { orders, catalog, parties, dispatcher, config }
    }

    // =========================================================================
    // Create
    // =========================================================================

    /// Turn a buyer's cart into a priced, pending order
    pub async fn create_order(
        &self,
        input: CreateOrderInput,
        buyer_id: &str,
    ) -> MarketResult<Order> {
        // 1. Resolve parties
        let buyer = self
            .parties
            .get_user(buyer_id)
            .await?
            .ok_or_else(|| MarketError::validation("buyer does not exist"))?;
        let seller = self
            .parties
            .get_seller(&input.seller)
            .await?
            .ok_or_else(|| MarketError::validation("seller does not exist"))?;
        if seller.status != SellerStatus::Active {
            return Err(MarketError::validation("seller is not active"));
        }

        if input.items.is_empty() {
            return Err(MarketError::validation("order must contain at least one item"));
        }

        // 2. Resolve and validate line items
        let mut items: Vec<OrderItem> = Vec::with_capacity(input.items.len());
        let mut physical: Vec<(String, i32)> = Vec::new();
        for item in &input.items {
            let item_ref = match (&item.product, &item.service) {
                (Some(product), None) => product,
                (None, Some(service)) => service,
                _ => {
                    return Err(MarketError::validation(
                        "each item must reference exactly one of product or service",
                    ));
                }
            };
            let record = self
                .catalog
                .get_item(item_ref)
                .await?
                .ok_or_else(|| {
                    MarketError::validation(format!("catalog item {} does not exist", item_ref))
                })?;
            if record.seller != input.seller {
                return Err(MarketError::validation(format!(
                    "{} does not belong to this seller",
                    record.name
                )));
            }
            if record.status != shared::models::CatalogStatus::Active {
                return Err(MarketError::validation(format!(
                    "{} is not available",
                    record.name
                )));
            }
            if record.is_physical() != item.product.is_some() {
                return Err(MarketError::validation(format!(
                    "{} referenced as the wrong item type",
                    record.name
                )));
            }
            money::validate_quantity(item.quantity)?;
            money::validate_price(record.price)?;
            if let Some(inventory) = record.inventory() {
                if inventory < item.quantity {
                    return Err(MarketError::validation(format!(
                        "insufficient inventory for {}",
                        record.name
                    )));
                }
                physical.push((record.id.clone(), item.quantity));
            }
            items.push(OrderItem {
                product: item.product.clone(),
                service: item.service.clone(),
                quantity: item.quantity,
                price: record.price,
                options: item.options.clone(),
                notes: item.notes.clone(),
            });
        }

        // 3. Shipping address is mandatory when anything ships
        let has_physical_product = !physical.is_empty();
        if has_physical_product && input.shipping_address.is_none() {
            return Err(MarketError::validation(
                "shipping address is required for physical products",
            ));
        }

        // 4. Price the cart
        let shipping_fee = input.shipping_fee.unwrap_or(0.0);
        let discount = input.discount.unwrap_or(0.0);
        let totals = pricing::compute_totals(&items, shipping_fee, discount, &self.config)?;

        // 5. Persist with a fresh order number
        let order_number = self.generate_order_number().await?;
        let now = Utc::now();
        let order = Order {
            id: None,
            order_number,
            buyer: buyer.id.clone(),
            seller: seller.id.clone(),
            items,
            status: OrderStatus::Pending,
            billing_address: input.billing_address,
            shipping_address: input.shipping_address,
            payment: PaymentInfo {
                method: input.payment_method,
                amount: totals.total,
                currency: input.currency.unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
                status: PaymentStatus::Pending,
                transaction_id: None,
                paid_at: None,
                refund_amount: None,
                refund_reason: None,
                payout_status: None,
            },
            subtotal: totals.subtotal,
            tax: totals.tax,
            shipping_fee,
            discount,
            total: totals.total,
            platform_fee: totals.platform_fee,
            seller_payout: totals.seller_payout,
            coupon_code: input.coupon_code,
            notes: input.notes,
            is_service_order: !has_physical_product,
            service_schedule: input.service_schedule,
            status_history: vec![StatusHistoryEntry {
                status: OrderStatus::Pending,
                note: Some("Order created".to_string()),
                updated_by: buyer.id.clone(),
                updated_by_role: ActorRole::Buyer,
                timestamp: now,
            }],
            cancellation_reason: None,
            tracking_info: None,
            created_at: now,
            updated_at: now,
        };
        let created = self.orders.create(order).await?;

        // 6. Reserve inventory; compensate if the adjuster fails mid-way
        self.reserve_inventory(&created, &physical).await?;

        // 7. Best-effort notifications
        self.dispatch_for(&created, &buyer, &seller, OrderEvent::Created);

        Ok(created)
    }

    /// Decrement stock for every physical line item
    ///
    /// On failure the already-applied decrements are restored and the
    /// order is cancelled with a system reason, so the order is never
    /// left pending against unreserved inventory.
    async fn reserve_inventory(
        &self,
        order: &Order,
        physical: &[(String, i32)],
    ) -> MarketResult<()> {
        let order_id = Self::id_of(order)?;
        let mut applied: Vec<(String, i32)> = Vec::new();
        for (product, quantity) in physical {
            match self.catalog.adjust_inventory(product, -quantity).await {
                Ok(()) => applied.push((product.clone(), *quantity)),
                Err(err) => {
                    tracing::error!(
                        order = %order.order_number,
                        product = %product,
                        error = %err,
                        "inventory reservation failed, compensating"
                    );
                    for (restored, qty) in &applied {
                        if let Err(restore_err) =
                            self.catalog.adjust_inventory(restored, *qty).await
                        {
                            tracing::error!(
                                order = %order.order_number,
                                product = %restored,
                                error = %restore_err,
                                "inventory restoration failed"
                            );
                        }
                    }
                    let entry = StatusHistoryEntry {
                        status: OrderStatus::Cancelled,
                        note: Some("Cancelled by system: inventory reservation failed".to_string()),
                        updated_by: "system".to_string(),
                        updated_by_role: ActorRole::Admin,
                        timestamp: Utc::now(),
                    };
                    if let Err(cancel_err) = self
                        .orders
                        .cancel(order_id, "inventory reservation failed", entry)
                        .await
                    {
                        tracing::error!(
                            order = %order.order_number,
                            error = %cancel_err,
                            "failed to cancel order after inventory failure"
                        );
                    }
                    return Err(err.into());
                }
            }
        }
        Ok(())
    }

    // =========================================================================
    // Status transitions
    // =========================================================================

    /// Move an order along the transition table, subject to actor role
    pub async fn update_order_status(
        &self,
        order_id: &str,
        new_status: OrderStatus,
        note: Option<&str>,
        actor: &Actor,
    ) -> MarketResult<Order> {
        let order = self.require_order(order_id).await?;
        self.require_mutation_rights(&order, actor).await?;

        // Cancellation owns inventory restoration; route through it
        if new_status == OrderStatus::Cancelled {
            return self
                .cancel_order(order_id, note.unwrap_or("Order cancelled"), actor)
                .await;
        }

        status::authorize_transition(order.status, new_status, actor.role)?;
        let mut current = self.apply_transition(&order, new_status, note, actor).await?;

        // Service orders have no shipping phase: confirming one completes it
        if current.is_service_order && new_status == OrderStatus::Confirmed {
            current = self
                .apply_transition(
                    &current,
                    OrderStatus::Completed,
                    Some("Service order auto-completed on confirmation"),
                    actor,
                )
                .await?;
        }

        Ok(current)
    }

    /// Persist one legal transition and fire its side effects
    async fn apply_transition(
        &self,
        order: &Order,
        to: OrderStatus,
        note: Option<&str>,
        actor: &Actor,
    ) -> MarketResult<Order> {
        let order_id = Self::id_of(order)?;
        let entry = Self::history_entry(to, note, actor);
        let mut updated = self.orders.update_status(order_id, order.status, entry).await?;

        if to == OrderStatus::Completed {
            updated = self
                .orders
                .update_payment(
                    order_id,
                    &PaymentUpdate {
                        payout_status: Some(PayoutStatus::Pending),
                        ..Default::default()
                    },
                )
                .await?;
        }

        self.notify_event(&updated, OrderEvent::StatusUpdated { status: to }).await;
        Ok(updated)
    }

    // =========================================================================
    // Cancel / refund / payment
    // =========================================================================

    /// Cancel an order and restore reserved inventory
    pub async fn cancel_order(
        &self,
        order_id: &str,
        reason: &str,
        actor: &Actor,
    ) -> MarketResult<Order> {
        let order = self.require_order(order_id).await?;
        self.require_mutation_rights(&order, actor).await?;

        if order.status == OrderStatus::Cancelled {
            return Err(MarketError::validation("order is already cancelled"));
        }
        if order.status == OrderStatus::Refunded {
            return Err(MarketError::validation("a refunded order cannot be cancelled"));
        }
        match actor.role {
            ActorRole::Buyer => {
                if !status::is_cancellable_by(order.status, ActorRole::Buyer) {
                    return Err(MarketError::authorization(format!(
                        "buyer may not cancel an order in {} status",
                        order.status
                    )));
                }
            }
            ActorRole::Seller | ActorRole::Admin => {
                if !status::is_cancellable_by(order.status, actor.role) {
                    return Err(MarketError::validation(format!(
                        "order cannot be cancelled in {} status",
                        order.status
                    )));
                }
            }
        }

        let entry = Self::history_entry(OrderStatus::Cancelled, Some(reason), actor);
        let updated = self.orders.cancel(order_id, reason, entry).await?;

        // Exact inverse of the creation-time decrements
        for item in updated.items.iter().filter(|i| i.is_physical()) {
            let product = item.product.as_deref().unwrap_or_default();
            if let Err(err) = self.catalog.adjust_inventory(product, item.quantity).await {
                tracing::error!(
                    order = %updated.order_number,
                    product = %product,
                    error = %err,
                    "inventory restoration failed on cancellation"
                );
            }
        }

        self.notify_event(&updated, OrderEvent::Cancelled { initiator: actor.role }).await;
        Ok(updated)
    }

    /// Refund a delivered or completed order
    pub async fn refund_order(
        &self,
        order_id: &str,
        amount: f64,
        reason: &str,
        actor: &Actor,
    ) -> MarketResult<Order> {
        let order = self.require_order(order_id).await?;
        match actor.role {
            ActorRole::Buyer => {
                return Err(MarketError::authorization(
                    "only the seller or an admin can issue refunds",
                ));
            }
            ActorRole::Seller => {
                self.seller_owned_by(&order.seller, &actor.id).await?;
            }
            ActorRole::Admin => {}
        }

        if !status::is_refund_eligible(order.status) {
            return Err(MarketError::validation(format!(
                "order in {} status is not eligible for refund",
                order.status
            )));
        }
        money::validate_amount(amount, "refund amount")?;
        if amount > order.payment.amount {
            return Err(MarketError::validation(format!(
                "refund amount {} exceeds the amount paid {}",
                amount, order.payment.amount
            )));
        }

        let entry = Self::history_entry(OrderStatus::Refunded, Some(reason), actor);
        let updated = self.orders.refund(order_id, amount, reason, entry).await?;

        self.notify_event(&updated, OrderEvent::Refunded { amount }).await;
        Ok(updated)
    }

    /// Apply a partial payment update (buyer or admin)
    pub async fn update_payment(
        &self,
        order_id: &str,
        update: PaymentUpdate,
        actor: &Actor,
    ) -> MarketResult<Order> {
        let order = self.require_order(order_id).await?;
        match actor.role {
            ActorRole::Buyer => {
                if order.buyer != actor.id {
                    return Err(MarketError::authorization("not your order"));
                }
            }
            ActorRole::Seller => {
                return Err(MarketError::authorization(
                    "only the buyer or an admin can update payment details",
                ));
            }
            ActorRole::Admin => {}
        }

        let was_completed = order.payment.status == PaymentStatus::Completed;
        let updated = self.orders.update_payment(order_id, &update).await?;

        if updated.payment.status == PaymentStatus::Completed && !was_completed {
            self.notify_event(&updated, OrderEvent::PaymentCompleted).await;
        }
        Ok(updated)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub async fn get_order(&self, order_id: &str, actor: &Actor) -> MarketResult<Order> {
        let order = self.require_order(order_id).await?;
        self.require_read_rights(&order, actor).await?;
        Ok(order)
    }

    pub async fn get_order_by_number(&self, number: &str, actor: &Actor) -> MarketResult<Order> {
        let order = self
            .orders
            .get_by_number(number)
            .await?
            .ok_or_else(|| MarketError::not_found("Order"))?;
        self.require_read_rights(&order, actor).await?;
        Ok(order)
    }

    pub async fn get_orders_by_buyer(
        &self,
        buyer_id: &str,
        opts: &ListOptions,
        actor: &Actor,
    ) -> MarketResult<Vec<Order>> {
        if !actor.is_admin() && (actor.role != ActorRole::Buyer || actor.id != buyer_id) {
            return Err(MarketError::authorization("cannot list another buyer's orders"));
        }
        Ok(self.orders.list_by_buyer(buyer_id, opts).await?)
    }

    pub async fn get_orders_by_seller(
        &self,
        seller_id: &str,
        opts: &ListOptions,
        actor: &Actor,
    ) -> MarketResult<Vec<Order>> {
        if !actor.is_admin() {
            if actor.role != ActorRole::Seller {
                return Err(MarketError::authorization("cannot list another seller's orders"));
            }
            self.seller_owned_by(seller_id, &actor.id).await?;
        }
        Ok(self.orders.list_by_seller(seller_id, opts).await?)
    }

    /// Search orders; non-admin callers have their own scope injected
    /// regardless of the filters they supplied
    pub async fn search_orders(
        &self,
        mut filters: OrderFilters,
        opts: &ListOptions,
        actor: &Actor,
    ) -> MarketResult<Vec<Order>> {
        match actor.role {
            ActorRole::Admin => {}
            ActorRole::Buyer => filters.buyer = Some(actor.id.clone()),
            ActorRole::Seller => {
                let seller = self
                    .parties
                    .get_seller_by_user(&actor.id)
                    .await?
                    .ok_or_else(|| {
                        MarketError::authorization("no seller profile for this user")
                    })?;
                filters.seller = Some(seller.id);
            }
        }
        Ok(self.orders.search(&filters, opts).await?)
    }

    pub async fn get_order_statistics(
        &self,
        seller_id: Option<&str>,
        actor: &Actor,
    ) -> MarketResult<OrderStats> {
        match actor.role {
            ActorRole::Admin => Ok(self.orders.statistics(seller_id).await?),
            ActorRole::Seller => {
                let own = self
                    .parties
                    .get_seller_by_user(&actor.id)
                    .await?
                    .ok_or_else(|| {
                        MarketError::authorization("no seller profile for this user")
                    })?;
                if let Some(requested) = seller_id {
                    if requested != own.id {
                        return Err(MarketError::authorization(
                            "cannot view another seller's statistics",
                        ));
                    }
                }
                Ok(self.orders.statistics(Some(&own.id)).await?)
            }
            ActorRole::Buyer => {
                Err(MarketError::authorization("statistics are not available to buyers"))
            }
        }
    }

    /// Marketplace-wide recent orders feed (admin dashboards)
    pub async fn get_recent_orders(&self, limit: usize, actor: &Actor) -> MarketResult<Vec<Order>> {
        if !actor.is_admin() {
            return Err(MarketError::authorization("recent orders are admin-only"));
        }
        Ok(self.orders.recent(limit).await?)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn require_order(&self, order_id: &str) -> MarketResult<Order> {
        self.orders
            .get_by_id(order_id)
            .await?
            .ok_or_else(|| MarketError::not_found("Order"))
    }

    fn id_of(order: &Order) -> MarketResult<&str> {
        order
            .id
            .as_deref()
            .ok_or_else(|| MarketError::storage("persisted order is missing its id"))
    }

    fn history_entry(status: OrderStatus, note: Option<&str>, actor: &Actor) -> StatusHistoryEntry {
        StatusHistoryEntry {
            status,
            note: note.map(str::to_string),
            updated_by: actor.id.clone(),
            updated_by_role: actor.role,
            timestamp: Utc::now(),
        }
    }

    /// Resolve a seller and require that `user_id` owns it
    async fn seller_owned_by(&self, seller_id: &str, user_id: &str) -> MarketResult<Seller> {
        let seller = self
            .parties
            .get_seller(seller_id)
            .await?
            .ok_or_else(|| MarketError::not_found("Seller"))?;
        if !seller.is_owned_by(user_id) {
            return Err(MarketError::authorization("not your seller account"));
        }
        Ok(seller)
    }

    /// Buyer must own the order, seller must own the storefront, admin passes
    async fn require_mutation_rights(&self, order: &Order, actor: &Actor) -> MarketResult<()> {
        match actor.role {
            ActorRole::Admin => Ok(()),
            ActorRole::Buyer => {
                if order.buyer != actor.id {
                    return Err(MarketError::authorization("not your order"));
                }
                Ok(())
            }
            ActorRole::Seller => {
                self.seller_owned_by(&order.seller, &actor.id).await?;
                Ok(())
            }
        }
    }

    async fn require_read_rights(&self, order: &Order, actor: &Actor) -> MarketResult<()> {
        self.require_mutation_rights(order, actor).await
    }

    async fn generate_order_number(&self) -> MarketResult<String> {
        for _ in 0..ORDER_NUMBER_ATTEMPTS {
            let digits: u32 = rand::thread_rng().gen_range(0..100_000_000);
            let candidate = format!("ESM{:08}", digits);
            if self.orders.get_by_number(&candidate).await?.is_none() {
                return Ok(candidate);
            }
        }
        Err(MarketError::storage("could not allocate a unique order number"))
    }

    /// Resolve recipients and dispatch; lookup failures are logged only
    async fn notify_event(&self, order: &Order, event: OrderEvent) {
        let buyer = match self.parties.get_user(&order.buyer).await {
            Ok(Some(buyer)) => buyer,
            Ok(None) => {
                tracing::warn!(order = %order.order_number, "buyer vanished, skipping notifications");
                return;
            }
            Err(err) => {
                tracing::warn!(order = %order.order_number, error = %err, "buyer lookup failed, skipping notifications");
                return;
            }
        };
        let seller = match self.parties.get_seller(&order.seller).await {
            Ok(Some(seller)) => seller,
            Ok(None) => {
                tracing::warn!(order = %order.order_number, "seller vanished, skipping notifications");
                return;
            }
            Err(err) => {
                tracing::warn!(order = %order.order_number, error = %err, "seller lookup failed, skipping notifications");
                return;
            }
        };
        self.dispatch_for(order, &buyer, &seller, event);
    }

    fn dispatch_for(&self, order: &Order, buyer: &User, seller: &Seller, event: OrderEvent) {
        let ctx = NotifyContext {
            order,
            buyer_email: &buyer.email,
            seller_user: &seller.user,
            seller_email: &seller.contact_email,
        };
        let messages = notify::build_messages(&event, &ctx);
        self.dispatcher.dispatch(messages);
    }
}
