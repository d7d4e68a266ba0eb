//! Domain models

// Parties
pub mod seller;
pub mod user;

// Catalog
pub mod catalog;

// Orders
pub mod order;

// Re-exports
pub use catalog::{CatalogItem, CatalogItemKind, CatalogStatus};
pub use order::{
    Actor, ActorRole, Address, CreateOrderInput, Order, OrderItem, OrderItemInput, OrderStatus,
    PaymentInfo, PaymentStatus, PaymentUpdate, PayoutStatus, ServiceSchedule, StatusHistoryEntry,
    TrackingInfo,
};
pub use seller::{Seller, SellerStatus};
pub use user::User;
