//! Shared types for the ESM marketplace
//!
//! Domain models and error types used by the order service and any
//! transport layer built on top of it.

pub mod error;
pub mod models;

// Re-exports
pub use error::{MarketError, MarketErrorKind, MarketResult};
pub use serde::{Deserialize, Serialize};
