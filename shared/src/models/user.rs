//! User Model

use serde::{Deserialize, Serialize};

/// Marketplace user (buyer account, or the owner account behind a seller)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub is_active: bool,
}
