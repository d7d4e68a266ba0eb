//! Pricing Calculator
//!
//! Computes the monetary breakdown of an order from its line items.
//! Invariants enforced here and checked by tests:
//!
//! - `total == subtotal + tax + shipping_fee - discount`
//! - `seller_payout == subtotal - platform_fee`

use rust_decimal::Decimal;
use shared::models::OrderItem;
use shared::{MarketError, MarketResult};

use crate::config::PricingConfig;
use crate::money::{round_money, to_decimal, to_f64, validate_non_negative};

/// Monetary breakdown of an order, all values rounded to 2dp
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderTotals {
    pub subtotal: f64,
    pub tax: f64,
    pub platform_fee: f64,
    pub seller_payout: f64,
    pub total: f64,
}

/// Compute order totals from priced line items
///
/// Items must already carry their catalog unit price; price and quantity
/// validation happens when the items are resolved.
pub fn compute_totals(
    items: &[OrderItem],
    shipping_fee: f64,
    discount: f64,
    config: &PricingConfig,
) -> MarketResult<OrderTotals> {
    validate_non_negative(shipping_fee, "shipping fee")?;
    validate_non_negative(discount, "discount")?;

    let mut subtotal = Decimal::ZERO;
    for item in items {
        subtotal += to_decimal(item.price) * Decimal::from(item.quantity);
    }
    let subtotal = round_money(subtotal);

    let tax = round_money(subtotal * to_decimal(config.tax_rate));
    let platform_fee = round_money(subtotal * to_decimal(config.platform_fee_rate));
    let seller_payout = subtotal - platform_fee;
    let total = subtotal + tax + to_decimal(shipping_fee) - to_decimal(discount);

    if total < Decimal::ZERO {
        return Err(MarketError::validation(format!(
            "discount {} exceeds order value",
            discount
        )));
    }

    Ok(OrderTotals {
        subtotal: to_f64(subtotal),
        tax: to_f64(tax),
        platform_fee: to_f64(platform_fee),
        seller_payout: to_f64(seller_payout),
        total: to_f64(round_money(total)),
    })
}
