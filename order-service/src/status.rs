//! Status State Machine
//!
//! Legal order-status transitions and the per-role authorization maps.
//! `cancelled` and `refunded` are terminal; every other status has a
//! bounded set of outgoing edges.

use shared::models::{ActorRole, OrderStatus};
use shared::{MarketError, MarketResult};

use OrderStatus::*;

/// Legal outgoing edges for a status
pub fn allowed_targets(from: OrderStatus) -> &'static [OrderStatus] {
    match from {
        Pending => &[Processing, Confirmed, Cancelled],
        Processing => &[Confirmed, Cancelled],
        Confirmed => &[Shipped, Completed, Cancelled],
        Shipped => &[Delivered, Cancelled],
        Delivered => &[Completed, Refunded],
        Completed => &[Refunded],
        Cancelled => &[],
        Refunded => &[],
    }
}

/// Whether `from -> to` is an edge of the transition table
pub fn can_transition(from: OrderStatus, to: OrderStatus) -> bool {
    allowed_targets(from).contains(&to)
}

pub fn is_terminal(status: OrderStatus) -> bool {
    allowed_targets(status).is_empty()
}

/// Transitions a seller may apply (forward fulfillment only)
pub fn seller_may_transition(from: OrderStatus, to: OrderStatus) -> bool {
    matches!(
        (from, to),
        (Processing, Confirmed) | (Confirmed, Shipped) | (Confirmed, Completed) | (Shipped, Delivered)
    )
}

/// Transitions a buyer may apply (cancel while still pending)
pub fn buyer_may_transition(from: OrderStatus, to: OrderStatus) -> bool {
    matches!((from, to), (Pending, Cancelled))
}

/// Whether an order in `status` may be cancelled by the given role
pub fn is_cancellable_by(status: OrderStatus, role: ActorRole) -> bool {
    match role {
        ActorRole::Buyer => status == Pending,
        ActorRole::Seller => matches!(status, Pending | Processing | Confirmed),
        ActorRole::Admin => !matches!(status, Cancelled | Refunded | Delivered | Completed),
    }
}

/// Whether an order in `status` is eligible for a refund
pub fn is_refund_eligible(status: OrderStatus) -> bool {
    matches!(status, Delivered | Completed)
}

/// Authorize a status transition for the given role, then check the table
///
/// Role restrictions fail with an Authorization error; table violations
/// fail with a Validation error. Admins are bound by the table only.
pub fn authorize_transition(
    from: OrderStatus,
    to: OrderStatus,
    role: ActorRole,
) -> MarketResult<()> {
    match role {
        ActorRole::Admin => {}
        ActorRole::Seller => {
            if !seller_may_transition(from, to) {
                return Err(MarketError::authorization(format!(
                    "seller may not move an order from {} to {}",
                    from, to
                )));
            }
        }
        ActorRole::Buyer => {
            if !buyer_may_transition(from, to) {
                return Err(MarketError::authorization(format!(
                    "buyer may not move an order from {} to {}",
                    from, to
                )));
            }
        }
    }
    if !can_transition(from, to) {
        return Err(MarketError::validation(format!(
            "invalid status transition from {} to {}",
            from, to
        )));
    }
    Ok(())
}
