//! Collaborator contracts consumed by the orchestrator
//!
//! Persistence lives behind these traits; the orchestrator never sees a
//! database. Raw store errors are converted into `MarketError` at the
//! service boundary.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::MarketError;
use shared::models::{
    CatalogItem, Order, OrderStatus, PaymentUpdate, Seller, StatusHistoryEntry, User,
};
use std::collections::HashMap;
use thiserror::Error;

/// Store error types
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Insufficient inventory for {0}")]
    InsufficientInventory(String),

    #[error("Database error: {0}")]
    Database(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for MarketError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(resource) => MarketError::not_found(resource),
            StoreError::Conflict(message) => MarketError::validation(message),
            StoreError::InsufficientInventory(item) => {
                MarketError::validation(format!("insufficient inventory for {}", item))
            }
            StoreError::Database(message) => MarketError::storage(message),
        }
    }
}

/// Pagination options for list/search operations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListOptions {
    pub limit: Option<usize>,
    pub offset: usize,
}

/// Search filters; non-admin callers get their scope force-injected
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderFilters {
    pub buyer: Option<String>,
    pub seller: Option<String>,
    pub status: Option<OrderStatus>,
    pub order_number: Option<String>,
    pub is_service_order: Option<bool>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
}

/// Aggregate order statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderStats {
    pub total_orders: u64,
    pub by_status: HashMap<OrderStatus, u64>,
    pub total_revenue: f64,
    pub total_platform_fees: f64,
}

/// Order persistence contract
///
/// `update_status` must be serialized per order by the implementation:
/// it compares the stored status against `expected` and rejects the
/// write with `Conflict` when another transition got there first.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn create(&self, order: Order) -> StoreResult<Order>;
    async fn get_by_id(&self, id: &str) -> StoreResult<Option<Order>>;
    async fn get_by_number(&self, number: &str) -> StoreResult<Option<Order>>;
    async fn list_by_buyer(&self, buyer: &str, opts: &ListOptions) -> StoreResult<Vec<Order>>;
    async fn list_by_seller(&self, seller: &str, opts: &ListOptions) -> StoreResult<Vec<Order>>;
    async fn update_status(
        &self,
        id: &str,
        expected: OrderStatus,
        entry: StatusHistoryEntry,
    ) -> StoreResult<Order>;
    async fn update_payment(&self, id: &str, update: &PaymentUpdate) -> StoreResult<Order>;
    async fn cancel(
        &self,
        id: &str,
        reason: &str,
        entry: StatusHistoryEntry,
    ) -> StoreResult<Order>;
    async fn refund(
        &self,
        id: &str,
        amount: f64,
        reason: &str,
        entry: StatusHistoryEntry,
    ) -> StoreResult<Order>;
    async fn search(&self, filters: &OrderFilters, opts: &ListOptions) -> StoreResult<Vec<Order>>;
    async fn count(&self, filters: &OrderFilters) -> StoreResult<u64>;
    async fn statistics(&self, seller: Option<&str>) -> StoreResult<OrderStats>;
    async fn recent(&self, limit: usize) -> StoreResult<Vec<Order>>;
}

/// Catalog lookup and the atomic inventory primitive
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn get_item(&self, id: &str) -> StoreResult<Option<CatalogItem>>;

    /// Apply a signed delta to a product's stock counter
    ///
    /// Must be atomic w.r.t. concurrent callers and fail with
    /// `InsufficientInventory` when the delta would drop stock below zero.
    async fn adjust_inventory(&self, id: &str, delta: i32) -> StoreResult<()>;
}

/// Buyer and seller lookup
#[async_trait]
pub trait PartyStore: Send + Sync {
    async fn get_user(&self, id: &str) -> StoreResult<Option<User>>;
    async fn get_seller(&self, id: &str) -> StoreResult<Option<Seller>>;
    async fn get_seller_by_user(&self, user_id: &str) -> StoreResult<Option<Seller>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::MarketErrorKind;

    #[test]
    fn test_store_error_conversion() {
        let err: MarketError = StoreError::NotFound("Order".to_string()).into();
        assert_eq!(err.kind(), MarketErrorKind::NotFound);

        let err: MarketError = StoreError::InsufficientInventory("product-1".to_string()).into();
        assert_eq!(err.kind(), MarketErrorKind::Validation);

        let err: MarketError = StoreError::Conflict("status changed".to_string()).into();
        assert_eq!(err.kind(), MarketErrorKind::Validation);

        let err: MarketError = StoreError::Database("io".to_string()).into();
        assert_eq!(err.kind(), MarketErrorKind::Storage);
    }
}
