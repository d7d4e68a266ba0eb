//! Money calculation utilities using rust_decimal for precision
//!
//! All monetary arithmetic is done using `Decimal` internally, then
//! converted back to `f64` for storage/serialization. Rounding is to
//! 2 decimal places, half-up.

use rust_decimal::prelude::*;
use shared::MarketError;

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Maximum allowed unit price per item
const MAX_PRICE: f64 = 1_000_000.0;
/// Maximum allowed quantity per line item
const MAX_QUANTITY: i32 = 9999;

/// Convert f64 to Decimal for precise arithmetic
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or(Decimal::ZERO)
}

/// Convert Decimal back to f64 for storage
pub fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

/// Round a decimal to 2 places, half-up
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Validate that a f64 value is finite (not NaN, not Infinity)
#[inline]
fn require_finite(value: f64, field_name: &str) -> Result<(), MarketError> {
    if !value.is_finite() {
        return Err(MarketError::validation(format!(
            "{} must be a finite number, got {}",
            field_name, value
        )));
    }
    Ok(())
}

/// Validate a unit price coming from the catalog
pub fn validate_price(price: f64) -> Result<(), MarketError> {
    require_finite(price, "price")?;
    if price < 0.0 {
        return Err(MarketError::validation(format!(
            "price must be non-negative, got {}",
            price
        )));
    }
    if price > MAX_PRICE {
        return Err(MarketError::validation(format!(
            "price exceeds maximum allowed ({}), got {}",
            MAX_PRICE, price
        )));
    }
    Ok(())
}

/// Validate a line-item quantity
pub fn validate_quantity(quantity: i32) -> Result<(), MarketError> {
    if quantity <= 0 {
        return Err(MarketError::validation(format!(
            "quantity must be positive, got {}",
            quantity
        )));
    }
    if quantity > MAX_QUANTITY {
        return Err(MarketError::validation(format!(
            "quantity exceeds maximum allowed ({}), got {}",
            MAX_QUANTITY, quantity
        )));
    }
    Ok(())
}

/// Validate a non-negative monetary adjustment (shipping fee, discount)
pub fn validate_non_negative(value: f64, field_name: &str) -> Result<(), MarketError> {
    require_finite(value, field_name)?;
    if value < 0.0 {
        return Err(MarketError::validation(format!(
            "{} must be non-negative, got {}",
            field_name, value
        )));
    }
    Ok(())
}

/// Validate a refund or payment amount (strictly positive)
pub fn validate_amount(value: f64, field_name: &str) -> Result<(), MarketError> {
    require_finite(value, field_name)?;
    if value <= 0.0 {
        return Err(MarketError::validation(format!(
            "{} must be positive, got {}",
            field_name, value
        )));
    }
    Ok(())
}
