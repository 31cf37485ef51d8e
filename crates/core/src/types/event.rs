//! Payment provider webhook events.
//!
//! Only the fields the notifications use are typed. Everything else in the
//! event `data` object is kept in [`EventData::other`] so the full payload
//! can still be dumped into operator mail.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::price::Price;

/// Product name used when an event carries no item name.
pub const DEFAULT_PRODUCT_NAME: &str = "Vehicle History Report";

/// Event types the storefront reacts to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventType {
    TransactionCreated,
    TransactionPaid,
    TransactionCompleted,
    SubscriptionActivated,
    SubscriptionCanceled,
    /// Any event type without dedicated handling.
    Other(String),
}

impl EventType {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::TransactionCreated => "transaction.created",
            Self::TransactionPaid => "transaction.paid",
            Self::TransactionCompleted => "transaction.completed",
            Self::SubscriptionActivated => "subscription.activated",
            Self::SubscriptionCanceled => "subscription.canceled",
            Self::Other(name) => name,
        }
    }

    /// Whether the customer should receive a "payment succeeded" email.
    #[must_use]
    pub const fn is_payment_completed(&self) -> bool {
        matches!(self, Self::TransactionPaid | Self::TransactionCompleted)
    }
}

impl From<String> for EventType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "transaction.created" => Self::TransactionCreated,
            "transaction.paid" => Self::TransactionPaid,
            "transaction.completed" => Self::TransactionCompleted,
            "subscription.activated" => Self::SubscriptionActivated,
            "subscription.canceled" => Self::SubscriptionCanceled,
            _ => Self::Other(value),
        }
    }
}

impl From<EventType> for String {
    fn from(value: EventType) -> Self {
        match value {
            EventType::Other(name) => name,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unit price of an item, amount in minor units.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitPrice {
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub currency_code: Option<String>,
}

/// The price attached to an event item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPrice {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub unit_price: Option<UnitPrice>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventItem {
    #[serde(default)]
    pub price: Option<EventPrice>,
    #[serde(default)]
    pub quantity: Option<u32>,
}

/// The `data` object of an event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventData {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub subscription_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub items: Vec<EventItem>,
    #[serde(flatten)]
    pub other: serde_json::Map<String, serde_json::Value>,
}

impl EventData {
    fn first_price(&self) -> Option<&EventPrice> {
        self.items.first().and_then(|item| item.price.as_ref())
    }

    /// Name of the first item's price, if any.
    #[must_use]
    pub fn product_name(&self) -> Option<&str> {
        self.first_price().and_then(|price| price.name.as_deref())
    }

    /// Unit price of the first item. A missing amount counts as zero.
    #[must_use]
    pub fn first_item_price(&self) -> Option<Price> {
        let price = self.first_price()?;
        let unit = price.unit_price.clone().unwrap_or_default();
        Some(Price::from_minor_units(
            unit.amount.as_deref().unwrap_or("0"),
            unit.currency_code.as_deref(),
        ))
    }
}

/// A verified webhook notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookEvent {
    #[serde(default)]
    pub event_id: Option<String>,
    pub event_type: EventType,
    #[serde(default)]
    pub occurred_at: Option<String>,
    #[serde(default)]
    pub data: EventData,
}

impl WebhookEvent {
    /// Subject line of the operator summary email.
    #[must_use]
    pub fn summary_subject(&self) -> String {
        let id = self.data.id.as_deref().unwrap_or("unknown");
        match self.event_type {
            EventType::TransactionCreated => format!("New Transaction Created: {id}"),
            EventType::TransactionPaid => format!("Transaction Paid: {id}"),
            EventType::TransactionCompleted => format!("Transaction Completed: {id}"),
            EventType::SubscriptionActivated => format!("Subscription Activated: {id}"),
            EventType::SubscriptionCanceled => format!("Subscription Canceled: {id}"),
            EventType::Other(ref name) => format!("Paddle Event: {name}"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const PAID: &str = r#"{
        "event_id": "evt_01",
        "event_type": "transaction.paid",
        "occurred_at": "2026-10-19T10:00:00Z",
        "notification_id": "ntf_01",
        "data": {
            "id": "txn_01",
            "customer_id": "ctm_01",
            "status": "paid",
            "currency_code": "USD",
            "items": [{
                "quantity": 1,
                "price": {
                    "id": "pri_01",
                    "name": "Full VIN report",
                    "unit_price": { "amount": "199", "currency_code": "USD" }
                }
            }]
        }
    }"#;

    #[test]
    fn test_parse_paid_event() {
        let event: WebhookEvent = serde_json::from_str(PAID).unwrap();
        assert_eq!(event.event_type, EventType::TransactionPaid);
        assert!(event.event_type.is_payment_completed());
        assert_eq!(event.data.customer_id.as_deref(), Some("ctm_01"));
        assert_eq!(event.data.product_name(), Some("Full VIN report"));
        assert_eq!(
            event.data.first_item_price().map(|p| p.display_amount()),
            Some("1.99".to_string())
        );
        assert_eq!(event.data.other["currency_code"], "USD");
        assert_eq!(event.summary_subject(), "Transaction Paid: txn_01");
    }

    #[test]
    fn test_unknown_event_type_round_trips() {
        let event: WebhookEvent = serde_json::from_str(
            r#"{"event_type":"address.created","data":{"id":"add_01"}}"#,
        )
        .unwrap();
        assert_eq!(event.event_type, EventType::Other("address.created".into()));
        assert!(!event.event_type.is_payment_completed());
        assert_eq!(event.summary_subject(), "Paddle Event: address.created");

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event_type"], "address.created");
    }

    #[test]
    fn test_subjects() {
        let mut event: WebhookEvent = serde_json::from_str(PAID).unwrap();
        for (ty, subject) in [
            (EventType::TransactionCreated, "New Transaction Created: txn_01"),
            (EventType::TransactionCompleted, "Transaction Completed: txn_01"),
            (EventType::SubscriptionActivated, "Subscription Activated: txn_01"),
            (EventType::SubscriptionCanceled, "Subscription Canceled: txn_01"),
        ] {
            event.event_type = ty;
            assert_eq!(event.summary_subject(), subject);
        }
    }

    #[test]
    fn test_items_missing() {
        let event: WebhookEvent =
            serde_json::from_str(r#"{"event_type":"transaction.created","data":{}}"#).unwrap();
        assert!(event.data.items.is_empty());
        assert!(event.data.first_item_price().is_none());
        assert!(event.data.product_name().is_none());
    }
}
