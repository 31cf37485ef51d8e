//! Flat transaction record shown by the lookup endpoint.

use serde::{Deserialize, Serialize};

/// Placeholder for a nested provider field that was absent.
pub const NOT_AVAILABLE: &str = "N/A";

/// One purchased line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionItem {
    pub price_id: Option<String>,
    pub quantity: Option<u32>,
    /// Price description, or [`NOT_AVAILABLE`].
    pub description: String,
}

/// A payment provider transaction reshaped for display.
///
/// Required top-level fields are copied as-is. Deeply nested values that the
/// provider may leave out (grand total, payment method) fall back to
/// [`NOT_AVAILABLE`] rather than failing the lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub id: String,
    pub status: String,
    /// Grand total in minor units as sent by the provider, or [`NOT_AVAILABLE`].
    pub amount: String,
    pub currency: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub customer_id: Option<String>,
    pub subscription_id: Option<String>,
    pub items: Vec<TransactionItem>,
    /// Provider billing details, passed through untouched.
    pub billing_details: Option<serde_json::Value>,
    /// Type of the first payment method, or [`NOT_AVAILABLE`].
    pub payment_method: String,
}
