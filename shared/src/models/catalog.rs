//! Catalog Model
//!
//! Unified view over products and services as the order core consumes
//! them: one record shape, physical items carry an inventory counter.

use serde::{Deserialize, Serialize};

/// Catalog item status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CatalogStatus {
    #[default]
    Active,
    Inactive,
}

/// Physical product vs. bookable service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CatalogItemKind {
    /// Shippable product with a stock counter
    Product { inventory: i32 },
    /// Service with no shipping phase
    Service,
}

/// Catalog item entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: String,
    /// Owning seller ID
    pub seller: String,
    pub name: String,
    /// Unit price in currency unit
    pub price: f64,
    pub status: CatalogStatus,
    #[serde(flatten)]
    pub kind: CatalogItemKind,
}

impl CatalogItem {
    pub fn is_physical(&self) -> bool {
        matches!(self.kind, CatalogItemKind::Product { .. })
    }

    /// Stock on hand; `None` for services
    pub fn inventory(&self) -> Option<i32> {
        match self.kind {
            CatalogItemKind::Product { inventory } => Some(inventory),
            CatalogItemKind::Service => None,
        }
    }
}
