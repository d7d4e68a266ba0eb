//! In-memory store implementations
//!
//! Backing for tests and a reference for real store implementations.
//! Inventory adjustment is atomic under the catalog write lock, and
//! status writes are rejected when the expected current status no longer
//! matches, which serializes racing transitions. Cancel and refund are
//! rejected once the order is terminal, so a racing second caller gets
//! a conflict instead of re-applying side effects.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use shared::models::{
    CatalogItem, CatalogItemKind, Order, OrderStatus, PaymentStatus, PaymentUpdate, Seller,
    StatusHistoryEntry, User,
};
use std::collections::HashMap;
use std::sync::Arc;

use crate::stores::{
    CatalogStore, ListOptions, OrderFilters, OrderStats, OrderStore, PartyStore, StoreError,
    StoreResult,
};

// =============================================================================
// MemoryOrderStore
// =============================================================================

/// In-memory order store
#[derive(Clone, Default)]
pub struct MemoryOrderStore {
    orders: Arc<RwLock<HashMap<String, Order>>>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn matches(order: &Order, filters: &OrderFilters) -> bool {
        if let Some(buyer) = &filters.buyer {
            if &order.buyer != buyer {
                return false;
            }
        }
        if let Some(seller) = &filters.seller {
            if &order.seller != seller {
                return false;
            }
        }
        if let Some(status) = filters.status {
            if order.status != status {
                return false;
            }
        }
        if let Some(number) = &filters.order_number {
            if &order.order_number != number {
                return false;
            }
        }
        if let Some(is_service) = filters.is_service_order {
            if order.is_service_order != is_service {
                return false;
            }
        }
        if let Some(after) = filters.created_after {
            if order.created_at < after {
                return false;
            }
        }
        if let Some(before) = filters.created_before {
            if order.created_at > before {
                return false;
            }
        }
        true
    }

    fn paginate(mut orders: Vec<Order>, opts: &ListOptions) -> Vec<Order> {
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let offset = opts.offset.min(orders.len());
        let mut page: Vec<Order> = orders.split_off(offset);
        if let Some(limit) = opts.limit {
            page.truncate(limit);
        }
        page
    }

    fn with_order(
        &self,
        id: &str,
        f: impl FnOnce(&mut Order) -> StoreResult<()>,
    ) -> StoreResult<Order> {
        let mut orders = self.orders.write();
        let order = orders
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound("Order".to_string()))?;
        f(order)?;
        order.updated_at = Utc::now();
        Ok(order.clone())
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn create(&self, mut order: Order) -> StoreResult<Order> {
        let id = order
            .id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        order.id = Some(id.clone());
        let mut orders = self.orders.write();
        if orders.values().any(|o| o.order_number == order.order_number) {
            return Err(StoreError::Conflict(format!(
                "order number {} already exists",
                order.order_number
            )));
        }
        orders.insert(id, order.clone());
        Ok(order)
    }

    async fn get_by_id(&self, id: &str) -> StoreResult<Option<Order>> {
        Ok(self.orders.read().get(id).cloned())
    }

    async fn get_by_number(&self, number: &str) -> StoreResult<Option<Order>> {
        Ok(self
            .orders
            .read()
            .values()
            .find(|o| o.order_number == number)
            .cloned())
    }

    async fn list_by_buyer(&self, buyer: &str, opts: &ListOptions) -> StoreResult<Vec<Order>> {
        let orders: Vec<Order> = self
            .orders
            .read()
            .values()
            .filter(|o| o.buyer == buyer)
            .cloned()
            .collect();
        Ok(Self::paginate(orders, opts))
    }

    async fn list_by_seller(&self, seller: &str, opts: &ListOptions) -> StoreResult<Vec<Order>> {
        let orders: Vec<Order> = self
            .orders
            .read()
            .values()
            .filter(|o| o.seller == seller)
            .cloned()
            .collect();
        Ok(Self::paginate(orders, opts))
    }

    async fn update_status(
        &self,
        id: &str,
        expected: OrderStatus,
        entry: StatusHistoryEntry,
    ) -> StoreResult<Order> {
        self.with_order(id, |order| {
            if order.status != expected {
                return Err(StoreError::Conflict(format!(
                    "order status changed concurrently: expected {}, found {}",
                    expected, order.status
                )));
            }
            order.status = entry.status;
            order.status_history.push(entry);
            Ok(())
        })
    }

    async fn update_payment(&self, id: &str, update: &PaymentUpdate) -> StoreResult<Order> {
        self.with_order(id, |order| {
            if let Some(method) = &update.method {
                order.payment.method = method.clone();
            }
            if let Some(transaction_id) = &update.transaction_id {
                order.payment.transaction_id = Some(transaction_id.clone());
            }
            if let Some(status) = update.status {
                order.payment.status = status;
                if status == PaymentStatus::Completed && order.payment.paid_at.is_none() {
                    order.payment.paid_at = Some(Utc::now());
                }
            }
            if let Some(payout_status) = update.payout_status {
                order.payment.payout_status = Some(payout_status);
            }
            Ok(())
        })
    }

    async fn cancel(
        &self,
        id: &str,
        reason: &str,
        entry: StatusHistoryEntry,
    ) -> StoreResult<Order> {
        self.with_order(id, |order| {
            if crate::status::is_terminal(order.status) {
                return Err(StoreError::Conflict(format!(
                    "order is already {}, cannot cancel",
                    order.status
                )));
            }
            order.status = OrderStatus::Cancelled;
            order.cancellation_reason = Some(reason.to_string());
            order.status_history.push(entry);
            Ok(())
        })
    }

    async fn refund(
        &self,
        id: &str,
        amount: f64,
        reason: &str,
        entry: StatusHistoryEntry,
    ) -> StoreResult<Order> {
        self.with_order(id, |order| {
            if crate::status::is_terminal(order.status) {
                return Err(StoreError::Conflict(format!(
                    "order is already {}, cannot refund",
                    order.status
                )));
            }
            order.status = OrderStatus::Refunded;
            order.payment.status = PaymentStatus::Refunded;
            order.payment.refund_amount = Some(amount);
            order.payment.refund_reason = Some(reason.to_string());
            order.status_history.push(entry);
            Ok(())
        })
    }

    async fn search(&self, filters: &OrderFilters, opts: &ListOptions) -> StoreResult<Vec<Order>> {
        let orders: Vec<Order> = self
            .orders
            .read()
            .values()
            .filter(|o| Self::matches(o, filters))
            .cloned()
            .collect();
        Ok(Self::paginate(orders, opts))
    }

    async fn count(&self, filters: &OrderFilters) -> StoreResult<u64> {
        Ok(self
            .orders
            .read()
            .values()
            .filter(|o| Self::matches(o, filters))
            .count() as u64)
    }

    async fn statistics(&self, seller: Option<&str>) -> StoreResult<OrderStats> {
        let orders = self.orders.read();
        let mut stats = OrderStats::default();
        for order in orders.values() {
            if let Some(seller) = seller {
                if order.seller != seller {
                    continue;
                }
            }
            stats.total_orders += 1;
            *stats.by_status.entry(order.status).or_insert(0) += 1;
            if !matches!(order.status, OrderStatus::Cancelled | OrderStatus::Refunded) {
                stats.total_revenue += order.total;
                stats.total_platform_fees += order.platform_fee;
            }
        }
        Ok(stats)
    }

    async fn recent(&self, limit: usize) -> StoreResult<Vec<Order>> {
        let orders: Vec<Order> = self.orders.read().values().cloned().collect();
        Ok(Self::paginate(orders, &ListOptions { limit: Some(limit), offset: 0 }))
    }
}

// =============================================================================
// MemoryCatalogStore
// =============================================================================

/// In-memory catalog store with an atomic stock counter
#[derive(Clone, Default)]
pub struct MemoryCatalogStore {
    items: Arc<RwLock<HashMap<String, CatalogItem>>>,
}

impl MemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, item: CatalogItem) {
        self.items.write().insert(item.id.clone(), item);
    }

    /// Current stock for a product; `None` for services or unknown ids
    pub fn inventory_of(&self, id: &str) -> Option<i32> {
        self.items.read().get(id).and_then(CatalogItem::inventory)
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn get_item(&self, id: &str) -> StoreResult<Option<CatalogItem>> {
        Ok(self.items.read().get(id).cloned())
    }

    async fn adjust_inventory(&self, id: &str, delta: i32) -> StoreResult<()> {
        let mut items = self.items.write();
        let item = items
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound("Catalog item".to_string()))?;
        match &mut item.kind {
            CatalogItemKind::Product { inventory } => {
                let next = *inventory + delta;
                if next < 0 {
                    return Err(StoreError::InsufficientInventory(id.to_string()));
                }
                *inventory = next;
                Ok(())
            }
            CatalogItemKind::Service => Err(StoreError::Conflict(format!(
                "{} is a service and carries no inventory",
                id
            ))),
        }
    }
}

// =============================================================================
// MemoryPartyStore
// =============================================================================

/// In-memory user/seller store
#[derive(Clone, Default)]
pub struct MemoryPartyStore {
    users: Arc<RwLock<HashMap<String, User>>>,
    sellers: Arc<RwLock<HashMap<String, Seller>>>,
}

impl MemoryPartyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_user(&self, user: User) {
        self.users.write().insert(user.id.clone(), user);
    }

    pub fn insert_seller(&self, seller: Seller) {
        self.sellers.write().insert(seller.id.clone(), seller);
    }
}

#[async_trait]
impl PartyStore for MemoryPartyStore {
    async fn get_user(&self, id: &str) -> StoreResult<Option<User>> {
        Ok(self.users.read().get(id).cloned())
    }

    async fn get_seller(&self, id: &str) -> StoreResult<Option<Seller>> {
        Ok(self.sellers.read().get(id).cloned())
    }

    async fn get_seller_by_user(&self, user_id: &str) -> StoreResult<Option<Seller>> {
        Ok(self
            .sellers
            .read()
            .values()
            .find(|s| s.user == user_id)
            .cloned())
    }
}
