//! Seller Model

use serde::{Deserialize, Serialize};

/// Seller account status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SellerStatus {
    #[default]
    Pending,
    Active,
    Suspended,
}

/// Seller entity (ex-servicemen marketplace storefront)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seller {
    pub id: String,
    /// Owner user ID
    pub user: String,
    pub business_name: String,
    pub contact_email: String,
    pub status: SellerStatus,
}

impl Seller {
    /// Whether the given user owns this seller profile
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user == user_id
    }
}
