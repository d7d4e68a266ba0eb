//! Pricing configuration
//!
//! Tax and platform-fee rates are injected rather than hard-coded; the
//! defaults preserve the marketplace's fixed rates.

use serde::{Deserialize, Serialize};

/// Injected pricing rates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Tax rate applied to the subtotal (fraction, e.g. 0.18 for 18% GST)
    pub tax_rate: f64,
    /// Marketplace commission on the subtotal (fraction, e.g. 0.05)
    pub platform_fee_rate: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self { tax_rate: 0.18, platform_fee_rate: 0.05 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rates() {
        let config = PricingConfig::default();
        assert_eq!(config.tax_rate, 0.18);
        assert_eq!(config.platform_fee_rate, 0.05);
    }
}
