//! Order lifecycle and fulfillment orchestration for the ESM marketplace
//!
//! This crate turns a buyer's cart into a priced, stateful order, enforces
//! who may move it through which states, reconciles inventory, and drives
//! the notification side effects of each transition.
//!
//! - **service**: `OrderService` composition root (create / status /
//!   payment / cancel / refund / queries)
//! - **status**: legal status transitions and per-role authorization
//! - **pricing**: subtotal / tax / platform fee / payout computation
//! - **notify**: event-to-message mapping and best-effort dispatch
//! - **stores**: collaborator contracts (orders, catalog, parties)
//! - **memory**: in-memory store implementations for tests
//!
//! # Operation Flow
//!
//! ```text
//! create_order(input, buyer)
//!     ├─ 1. Resolve buyer, seller, catalog items
//!     ├─ 2. Validate references, stock, shipping address
//!     ├─ 3. Compute totals (decimal, 2dp)
//!     ├─ 4. Persist order (status = PENDING)
//!     ├─ 5. Decrement inventory (compensate on failure)
//!     ├─ 6. Dispatch notifications (fire-and-forget)
//!     └─ 7. Return persisted order
//! ```

pub mod config;
pub mod memory;
pub mod money;
pub mod notify;
pub mod pricing;
pub mod service;
pub mod status;
pub mod stores;

// Re-exports
pub use config::PricingConfig;
pub use notify::{Mailer, NotificationDispatcher, Notifier, Outbound};
pub use pricing::OrderTotals;
pub use service::OrderService;
pub use stores::{
    CatalogStore, ListOptions, OrderFilters, OrderStats, OrderStore, PartyStore, StoreError,
    StoreResult,
};

// Re-export shared types for convenience
pub use shared::models::{Actor, ActorRole, Order, OrderStatus};
pub use shared::{MarketError, MarketResult};
