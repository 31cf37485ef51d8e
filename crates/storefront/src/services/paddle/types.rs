//! Paddle API response types.
//!
//! Only the fields the storefront reads are modelled; unknown fields are
//! ignored. Everything below the top level is optional because Paddle omits
//! nested objects depending on transaction state.

use serde::Deserialize;
use wheelstory_core::{NOT_AVAILABLE, TransactionItem, TransactionRecord};

/// Every Paddle response wraps its payload in `data`.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

/// A Paddle customer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Customer {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub currency_code: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub subscription_id: Option<String>,
    #[serde(default)]
    pub items: Option<Vec<LineItem>>,
    #[serde(default)]
    pub details: Option<Details>,
    #[serde(default)]
    pub billing_details: Option<serde_json::Value>,
    #[serde(default)]
    pub payments: Option<Vec<Payment>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LineItem {
    #[serde(default)]
    pub price_id: Option<String>,
    #[serde(default)]
    pub quantity: Option<u32>,
    #[serde(default)]
    pub price: Option<LinePrice>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LinePrice {
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Details {
    #[serde(default)]
    pub totals: Option<Totals>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Totals {
    #[serde(default)]
    pub grand_total: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Payment {
    #[serde(default)]
    pub method_details: Option<MethodDetails>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MethodDetails {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

fn or_not_available(value: Option<String>) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

impl From<Transaction> for TransactionRecord {
    fn from(txn: Transaction) -> Self {
        let amount = txn
            .details
            .and_then(|d| d.totals)
            .and_then(|t| t.grand_total);

        let payment_method = txn
            .payments
            .and_then(|payments| payments.into_iter().next())
            .and_then(|p| p.method_details)
            .and_then(|m| m.kind);

        let items = txn
            .items
            .unwrap_or_default()
            .into_iter()
            .map(|item| TransactionItem {
                price_id: item.price_id,
                quantity: item.quantity,
                description: or_not_available(item.price.and_then(|p| p.description)),
            })
            .collect();

        Self {
            id: txn.id,
            status: txn.status,
            amount: or_not_available(amount),
            currency: txn.currency_code,
            created_at: txn.created_at,
            updated_at: txn.updated_at,
            customer_id: txn.customer_id,
            subscription_id: txn.subscription_id.filter(|s| !s.is_empty()),
            items,
            billing_details: txn.billing_details.filter(|v| !v.is_null()),
            payment_method: or_not_available(payment_method),
        }
    }
}
