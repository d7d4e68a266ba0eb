//! Order Model
//!
//! The order aggregate plus the input payloads consumed by the order
//! service. Monetary fields are `f64` in currency units; all arithmetic
//! on them happens through the order service's decimal helpers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Order status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Confirmed,
    Shipped,
    Delivered,
    Completed,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Confirmed => "confirmed",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Failed,
    Refunded,
}

/// Seller payout status (set when an order completes)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayoutStatus {
    Pending,
    Paid,
}

/// Role of the actor performing an operation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActorRole {
    Buyer,
    Seller,
    Admin,
}

/// Explicit actor identity passed into every order operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    /// User ID
    pub id: String,
    pub role: ActorRole,
}

impl Actor {
    pub fn buyer(id: impl Into<String>) -> Self {
        Self { id: id.into(), role: ActorRole::Buyer }
    }

    pub fn seller(id: impl Into<String>) -> Self {
        Self { id: id.into(), role: ActorRole::Seller }
    }

    pub fn admin(id: impl Into<String>) -> Self {
        Self { id: id.into(), role: ActorRole::Admin }
    }

    pub fn is_admin(&self) -> bool {
        self.role == ActorRole::Admin
    }
}

/// Postal address
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Address {
    pub full_name: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub phone: Option<String>,
}

/// Order line item
///
/// Exactly one of `product` / `service` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    /// Product reference (physical, shippable)
    pub product: Option<String>,
    /// Service reference (no shipping phase)
    pub service: Option<String>,
    pub quantity: i32,
    /// Unit price in currency unit, captured from the catalog at creation
    pub price: f64,
    pub options: Option<serde_json::Value>,
    pub notes: Option<String>,
}

impl OrderItem {
    pub fn is_physical(&self) -> bool {
        self.product.is_some()
    }
}

/// Order payment block
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInfo {
    pub method: String,
    /// Amount due in currency unit
    pub amount: f64,
    pub currency: String,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub refund_amount: Option<f64>,
    pub refund_reason: Option<String>,
    pub payout_status: Option<PayoutStatus>,
}

/// Service booking window for service orders
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSchedule {
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub duration: Option<String>,
    pub location: Option<String>,
}

/// Shipment tracking details
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingInfo {
    pub carrier: String,
    pub tracking_number: String,
    pub estimated_delivery: Option<DateTime<Utc>>,
}

/// One entry of the append-only status audit trail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    pub status: OrderStatus,
    pub note: Option<String>,
    /// User ID of the actor who applied the change
    pub updated_by: String,
    pub updated_by_role: ActorRole,
    pub timestamp: DateTime<Utc>,
}

/// Order aggregate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Option<String>,
    /// Generated once at creation, format `ESM` + 8 digits, immutable
    pub order_number: String,
    /// Buyer user ID
    pub buyer: String,
    /// Seller ID
    pub seller: String,
    pub items: Vec<OrderItem>,
    pub status: OrderStatus,
    pub billing_address: Address,
    /// Required iff any item is a physical product
    pub shipping_address: Option<Address>,
    pub payment: PaymentInfo,
    pub subtotal: f64,
    pub tax: f64,
    pub shipping_fee: f64,
    pub discount: f64,
    pub total: f64,
    pub platform_fee: f64,
    pub seller_payout: f64,
    pub coupon_code: Option<String>,
    pub notes: Option<String>,
    pub is_service_order: bool,
    pub service_schedule: Option<ServiceSchedule>,
    pub status_history: Vec<StatusHistoryEntry>,
    pub cancellation_reason: Option<String>,
    pub tracking_info: Option<TrackingInfo>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn has_physical_product(&self) -> bool {
        self.items.iter().any(OrderItem::is_physical)
    }

    /// Most recent status-history entry, if any
    pub fn last_status_entry(&self) -> Option<&StatusHistoryEntry> {
        self.status_history.last()
    }
}

/// Create order line-item payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemInput {
    pub product: Option<String>,
    pub service: Option<String>,
    pub quantity: i32,
    pub options: Option<serde_json::Value>,
    pub notes: Option<String>,
}

/// Create order payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderInput {
    pub seller: String,
    pub items: Vec<OrderItemInput>,
    pub billing_address: Address,
    pub shipping_address: Option<Address>,
    pub payment_method: String,
    pub currency: Option<String>,
    pub shipping_fee: Option<f64>,
    pub discount: Option<f64>,
    pub coupon_code: Option<String>,
    pub notes: Option<String>,
    pub service_schedule: Option<ServiceSchedule>,
}

/// Partial payment update payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentUpdate {
    pub method: Option<String>,
    pub status: Option<PaymentStatus>,
    pub transaction_id: Option<String>,
    pub payout_status: Option<PayoutStatus>,
}
