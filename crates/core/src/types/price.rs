//! Type-safe price representation using decimal arithmetic.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Currency assumed when a provider payload leaves it out.
pub const DEFAULT_CURRENCY: &str = "USD";

/// An amount with its ISO 4217 currency code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Price {
    /// Amount in the currency's standard unit (dollars, not cents).
    pub amount: Decimal,
    pub currency_code: String,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub fn new(amount: Decimal, currency_code: impl Into<String>) -> Self {
        Self {
            amount,
            currency_code: currency_code.into(),
        }
    }

    /// Build a price from an amount in minor units (cents).
    ///
    /// Providers send totals as decimal strings of minor units, e.g. `"199"`
    /// for 1.99. An unparsable amount becomes zero.
    #[must_use]
    pub fn from_minor_units(minor: &str, currency_code: Option<&str>) -> Self {
        let minor: Decimal = minor.trim().parse().unwrap_or(Decimal::ZERO);
        let amount = (minor / Decimal::ONE_HUNDRED).round_dp(2);
        Self::new(amount, currency_code.unwrap_or(DEFAULT_CURRENCY))
    }

    /// The amount with exactly two decimal places, e.g. `"1.99"`.
    #[must_use]
    pub fn display_amount(&self) -> String {
        format!("{:.2}", self.amount)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.display_amount(), self.currency_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_minor_units() {
        let price = Price::from_minor_units("199", Some("EUR"));
        assert_eq!(price.display_amount(), "1.99");
        assert_eq!(price.currency_code, "EUR");
        assert_eq!(price.to_string(), "1.99 EUR");
    }

    #[test]
    fn test_from_minor_units_defaults_currency() {
        let price = Price::from_minor_units("2500", None);
        assert_eq!(price.display_amount(), "25.00");
        assert_eq!(price.currency_code, "USD");
    }

    #[test]
    fn test_from_minor_units_garbage_is_zero() {
        assert_eq!(Price::from_minor_units("", None).display_amount(), "0.00");
        assert_eq!(Price::from_minor_units("abc", None).display_amount(), "0.00");
    }

    #[test]
    fn test_display_amount_pads() {
        let price = Price::new(Decimal::new(5, 0), "USD");
        assert_eq!(price.display_amount(), "5.00");
    }
}
