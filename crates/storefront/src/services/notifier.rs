//! Transactional email composition.
//!
//! [`Notifier`] renders every email the storefront sends and hands it to the
//! right [`Mailer`]: customer mail goes through the customer transport,
//! operator mail through the operations transport. Handlers never touch a
//! transport directly.

use askama::Template;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;
use wheelstory_core::{
    DEFAULT_PRODUCT_NAME, NOT_AVAILABLE, PaymentFormData, Price, WebhookEvent, card,
};

use super::mail::{Mailers, MessageId, OutgoingEmail, SendError};

/// Subject of the delayed payment reminder.
pub const REMINDER_SUBJECT: &str =
    "Payment Completion mail - IGNORE THIS IF YOU HAVE ALREADY PAID FOR THE REPORT";

/// Subject of the customer mail sent when the provider reports a payment.
pub const PAYMENT_SUCCESS_SUBJECT: &str =
    "Payment Successful - Your Vehicle Report is Being Prepared";

/// Subject of the customer confirmation sent after checkout.
pub const PAYMENT_CONFIRMATION_SUBJECT: &str =
    "Payment Confirmation - Your Vehicle History Report is Being Prepared";

const NOT_PROVIDED: &str = "Not provided";

/// Errors that can occur when composing or sending a notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The transport this notification needs has no credentials.
    #[error("{0} mail transport is not configured")]
    NotConfigured(&'static str),

    /// Template rendering failed.
    #[error("Failed to render email: {0}")]
    Render(#[from] askama::Error),

    /// The transport rejected the message.
    #[error(transparent)]
    Send(#[from] SendError),
}

/// Vehicle details the checkout page forwards with a payment notification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderData {
    pub vin: Option<String>,
    pub car_model: Option<String>,
    pub email: Option<String>,
    pub make: Option<String>,
    pub year: Option<String>,
    pub model: Option<String>,
    pub trim: Option<String>,
}

/// Everything needed to announce a collected order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentNotification {
    pub customer_email: String,
    pub customer_name: String,
    pub transaction_id: String,
    pub vin: String,
    pub car_model: Option<String>,
    pub amount: String,
    pub currency: String,
    pub form_data: Option<PaymentFormData>,
    pub order_data: Option<OrderData>,
    pub ordered_at: DateTime<Utc>,
}

/// Message ids of the two payment notification emails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationReceipt {
    pub notification_id: MessageId,
    pub customer_id: MessageId,
}

/// Receives accepted checkout submissions.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    /// Announce one collected order.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError` if either email cannot be sent.
    async fn dispatch(
        &self,
        notification: PaymentNotification,
    ) -> Result<NotificationReceipt, NotifyError>;
}

// =============================================================================
// Templates
// =============================================================================

#[derive(Template)]
#[template(path = "email/reminder.html")]
struct ReminderEmail<'a> {
    payment_link: &'a str,
}

#[derive(Template)]
#[template(path = "email/payment_success.html")]
struct PaymentSuccessEmail<'a> {
    customer_name: &'a str,
    customer_email: &'a str,
    transaction_id: &'a str,
    product_name: &'a str,
    amount: String,
    currency: &'a str,
}

#[derive(Template)]
#[template(path = "email/payment_confirmation_customer.html")]
struct PaymentConfirmationEmail<'a> {
    n: &'a PaymentNotification,
}

/// One labelled line in an operator email.
struct Row {
    label: &'static str,
    value: String,
}

impl Row {
    fn new(label: &'static str, value: &str) -> Self {
        let value = if value.trim().is_empty() {
            NOT_PROVIDED.to_string()
        } else {
            value.to_string()
        };
        Self { label, value }
    }
}

#[derive(Template)]
#[template(path = "email/payment_notification_admin.html")]
struct PaymentNotificationAdminEmail<'a> {
    n: &'a PaymentNotification,
    ordered_at: String,
    form_rows: Vec<Row>,
    vehicle_rows: Vec<Row>,
}

#[derive(Template)]
#[template(path = "email/vin_request.html")]
struct VinRequestEmail<'a> {
    vin: &'a str,
    car_model: &'a str,
    email: &'a str,
    requested_at: &'a str,
}

#[derive(Template)]
#[template(path = "email/vin_request.txt")]
struct VinRequestText<'a> {
    vin: &'a str,
    car_model: &'a str,
    email: &'a str,
    requested_at: &'a str,
}

/// First-item details shown in the operator event summary.
struct SummaryItem<'a> {
    product_name: &'a str,
    amount: String,
    currency: String,
    customer_id: &'a str,
    transaction_id: &'a str,
    status: &'a str,
}

#[derive(Template)]
#[template(path = "email/webhook_summary.html")]
struct WebhookSummaryEmail<'a> {
    event_type: &'a str,
    event_id: &'a str,
    occurred_at: &'a str,
    item: Option<SummaryItem<'a>>,
}

impl<'a> WebhookSummaryEmail<'a> {
    fn new(event: &'a WebhookEvent) -> Self {
        let data = &event.data;
        let item = data.first_item_price().map(|price| SummaryItem {
            product_name: data.product_name().unwrap_or("Unknown Product"),
            amount: price.display_amount(),
            currency: price.currency_code,
            customer_id: data.customer_id.as_deref().unwrap_or(NOT_AVAILABLE),
            transaction_id: data.id.as_deref().unwrap_or(NOT_AVAILABLE),
            status: data.status.as_deref().unwrap_or(NOT_AVAILABLE),
        });
        Self {
            event_type: event.event_type.as_str(),
            event_id: event.event_id.as_deref().unwrap_or(NOT_AVAILABLE),
            occurred_at: event.occurred_at.as_deref().unwrap_or(NOT_AVAILABLE),
            item,
        }
    }
}

fn form_rows(form: &PaymentFormData) -> Vec<Row> {
    // CVV is never included; the card number is masked.
    vec![
        Row::new("First Name", &form.first_name),
        Row::new("Last Name", &form.last_name),
        Row::new("Email", &form.email),
        Row::new("Country", &form.country),
        Row::new("Billing Address", &form.billing_address),
        Row::new("City", &form.city),
        Row::new("State", &form.state),
        Row::new("ZIP Code", &form.zip_code),
        Row::new("Name on Card", &form.name_on_card),
        Row::new("Card Number", &card::mask_number(&form.card_number)),
        Row::new("Expiry Date", &form.expiry_date),
    ]
}

fn vehicle_rows(order: &OrderData) -> Vec<Row> {
    let text = |v: &Option<String>| v.clone().unwrap_or_default();
    let mut rows = vec![
        Row::new("VIN", &text(&order.vin)),
        Row::new("Car Model", &text(&order.car_model)),
        Row::new("Order Email", &text(&order.email)),
    ];
    for (label, value) in [
        ("Make", &order.make),
        ("Year", &order.year),
        ("Model", &order.model),
        ("Trim", &order.trim),
    ] {
        if let Some(value) = value.as_deref().filter(|v| !v.trim().is_empty()) {
            rows.push(Row::new(label, value));
        }
    }
    rows
}

fn human_time(at: DateTime<Utc>) -> String {
    at.format("%B %-d, %Y at %I:%M %p UTC").to_string()
}

// =============================================================================
// Notifier
// =============================================================================

/// Renders and routes every storefront email.
#[derive(Debug, Clone)]
pub struct Notifier {
    mailers: Mailers,
    ops_recipients: Vec<String>,
    payment_link: String,
}

impl Notifier {
    #[must_use]
    pub fn new(mailers: Mailers, ops_recipients: Vec<String>, payment_link: String) -> Self {
        Self {
            mailers,
            ops_recipients,
            payment_link,
        }
    }

    fn customer_mailer(&self) -> Result<&dyn super::mail::Mailer, NotifyError> {
        self.mailers
            .customer
            .as_deref()
            .ok_or(NotifyError::NotConfigured("Customer"))
    }

    fn operations_mailer(&self) -> Result<&dyn super::mail::Mailer, NotifyError> {
        self.mailers
            .operations
            .as_deref()
            .ok_or(NotifyError::NotConfigured("Operations"))
    }

    /// Whether customer mail can be sent.
    #[must_use]
    pub const fn has_customer_mailer(&self) -> bool {
        self.mailers.customer.is_some()
    }

    /// Whether operator mail can be sent.
    #[must_use]
    pub const fn has_operations_mailer(&self) -> bool {
        self.mailers.operations.is_some()
    }

    /// Schedule the "payment pending" reminder for `email`.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError` if the customer transport is missing or fails.
    #[instrument(skip(self, email))]
    pub async fn send_reminder(
        &self,
        email: &str,
        vin: &str,
        deliver_at: DateTime<Utc>,
    ) -> Result<MessageId, NotifyError> {
        let mailer = self.customer_mailer()?;
        let html = ReminderEmail {
            payment_link: &self.payment_link,
        }
        .render()?;

        let message = OutgoingEmail::html(vec![email.to_string()], REMINDER_SUBJECT, html)
            .scheduled_at(deliver_at);
        Ok(mailer.send(message).await?)
    }

    /// Tell the operators a visitor asked for a report.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError` if the operations transport is missing or fails.
    #[instrument(skip(self, email))]
    pub async fn send_vin_request(
        &self,
        vin: &str,
        email: &str,
        car_model: &str,
        requested_at: DateTime<Utc>,
    ) -> Result<MessageId, NotifyError> {
        let mailer = self.operations_mailer()?;
        let requested_at = human_time(requested_at);

        let html = VinRequestEmail {
            vin,
            car_model,
            email,
            requested_at: &requested_at,
        }
        .render()?;
        let text = VinRequestText {
            vin,
            car_model,
            email,
            requested_at: &requested_at,
        }
        .render()?;

        let message = OutgoingEmail::html(
            self.ops_recipients.clone(),
            format!("New VIN Report Request - {vin} ({car_model})"),
            html,
        )
        .with_text(text);
        Ok(mailer.send(message).await?)
    }

    /// Send the operator order notification and the customer confirmation
    /// concurrently. Both must succeed.
    ///
    /// # Errors
    ///
    /// Returns the first `NotifyError` encountered.
    #[instrument(skip(self, n), fields(vin = %n.vin, transaction_id = %n.transaction_id))]
    pub async fn send_payment_notification(
        &self,
        n: &PaymentNotification,
    ) -> Result<NotificationReceipt, NotifyError> {
        let operations = self.operations_mailer()?;
        let customer = self.customer_mailer()?;

        let admin_html = PaymentNotificationAdminEmail {
            n,
            ordered_at: human_time(n.ordered_at),
            form_rows: n.form_data.as_ref().map(form_rows).unwrap_or_default(),
            vehicle_rows: n.order_data.as_ref().map(vehicle_rows).unwrap_or_default(),
        }
        .render()?;
        let customer_html = PaymentConfirmationEmail { n }.render()?;

        let admin = OutgoingEmail::html(
            self.ops_recipients.clone(),
            format!("New Vehicle History Report Order - {}", n.vin),
            admin_html,
        );
        let confirmation = OutgoingEmail::html(
            vec![n.customer_email.clone()],
            PAYMENT_CONFIRMATION_SUBJECT,
            customer_html,
        );

        let (admin, confirmation) =
            tokio::join!(operations.send(admin), customer.send(confirmation));

        Ok(NotificationReceipt {
            notification_id: admin?,
            customer_id: confirmation?,
        })
    }

    /// Tell a customer their payment went through. Operators are copied.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError` if the customer transport is missing or fails.
    #[instrument(skip(self, customer_email, customer_name, price))]
    pub async fn send_payment_success(
        &self,
        customer_email: &str,
        customer_name: &str,
        transaction_id: &str,
        product_name: Option<&str>,
        price: &Price,
    ) -> Result<MessageId, NotifyError> {
        let mailer = self.customer_mailer()?;
        let html = PaymentSuccessEmail {
            customer_name,
            customer_email,
            transaction_id,
            product_name: product_name.unwrap_or(DEFAULT_PRODUCT_NAME),
            amount: price.display_amount(),
            currency: &price.currency_code,
        }
        .render()?;

        let message = OutgoingEmail::html(
            vec![customer_email.to_string()],
            PAYMENT_SUCCESS_SUBJECT,
            html,
        )
        .with_bcc(self.ops_recipients.clone());
        Ok(mailer.send(message).await?)
    }

    /// Summarize a verified webhook event for the operators.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError` if the operations transport is missing or fails.
    #[instrument(skip(self, event), fields(event_type = %event.event_type))]
    pub async fn send_event_summary(&self, event: &WebhookEvent) -> Result<MessageId, NotifyError> {
        let mailer = self.operations_mailer()?;

        let html = WebhookSummaryEmail::new(event).render()?;
        let data = serde_json::to_string_pretty(&event.data).unwrap_or_default();
        let text = format!("Event: {}\nData: {data}", event.event_type);

        let message = OutgoingEmail::html(self.ops_recipients.clone(), event.summary_subject(), html)
            .with_text(text);
        Ok(mailer.send(message).await?)
    }
}

#[async_trait]
impl NotificationDispatcher for Notifier {
    async fn dispatch(
        &self,
        notification: PaymentNotification,
    ) -> Result<NotificationReceipt, NotifyError> {
        self.send_payment_notification(&notification).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::services::mail::Mailer;

    #[derive(Default)]
    struct Outbox {
        sent: Mutex<Vec<OutgoingEmail>>,
        fail: bool,
    }

    #[async_trait]
    impl Mailer for Outbox {
        async fn send(&self, email: OutgoingEmail) -> Result<MessageId, SendError> {
            if self.fail {
                return Err(SendError::Api {
                    status: 422,
                    message: "rejected".to_string(),
                });
            }
            let mut sent = self.sent.lock().unwrap();
            sent.push(email);
            Ok(MessageId(format!("msg_{}", sent.len())))
        }
    }

    fn notifier(customer: &Arc<Outbox>, operations: &Arc<Outbox>) -> Notifier {
        Notifier::new(
            Mailers {
                customer: Some(customer.clone()),
                operations: Some(operations.clone()),
            },
            vec!["ops@wheelstory.store".to_string()],
            "https://pay.example.com/checkout".to_string(),
        )
    }

    fn notification() -> PaymentNotification {
        PaymentNotification {
            customer_email: "buyer@example.com".to_string(),
            customer_name: "Ada Lovelace".to_string(),
            transaction_id: "TXN-1".to_string(),
            vin: "1HGCM82633A004352".to_string(),
            car_model: Some("Honda Accord".to_string()),
            amount: "1.99".to_string(),
            currency: "$".to_string(),
            form_data: Some(PaymentFormData {
                first_name: "Ada".to_string(),
                card_number: "4111 1111 1111 1111".to_string(),
                cvv: "987".to_string(),
                ..PaymentFormData::default()
            }),
            order_data: Some(OrderData {
                vin: Some("1HGCM82633A004352".to_string()),
                make: Some("Honda".to_string()),
                ..OrderData::default()
            }),
            ordered_at: DateTime::from_timestamp(1_760_000_000, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_reminder_is_scheduled_customer_mail() {
        let customer = Arc::new(Outbox::default());
        let ops = Arc::new(Outbox::default());
        let at = DateTime::from_timestamp(1_760_000_060, 0).unwrap();

        notifier(&customer, &ops)
            .send_reminder("buyer@example.com", "1HGCM82633A004352", at)
            .await
            .unwrap();

        let sent = customer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, REMINDER_SUBJECT);
        assert_eq!(sent[0].scheduled_at, Some(at));
        assert!(sent[0].html.contains("https://pay.example.com/checkout"));
        assert!(ops.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_payment_notification_masks_card() {
        let customer = Arc::new(Outbox::default());
        let ops = Arc::new(Outbox::default());

        let receipt = notifier(&customer, &ops)
            .send_payment_notification(&notification())
            .await
            .unwrap();
        assert_eq!(receipt.notification_id.0, "msg_1");
        assert_eq!(receipt.customer_id.0, "msg_1");

        let admin = ops.sent.lock().unwrap()[0].clone();
        assert_eq!(admin.subject, "New Vehicle History Report Order - 1HGCM82633A004352");
        assert_eq!(admin.to, vec!["ops@wheelstory.store".to_string()]);
        assert!(admin.html.contains("**** **** **** 1111"));
        assert!(!admin.html.contains("4111 1111 1111 1111"));
        assert!(!admin.html.contains("987"));
        assert!(admin.html.contains("Honda"));
        assert!(admin.html.contains(NOT_PROVIDED));

        let confirmation = customer.sent.lock().unwrap()[0].clone();
        assert_eq!(confirmation.subject, PAYMENT_CONFIRMATION_SUBJECT);
        assert_eq!(confirmation.to, vec!["buyer@example.com".to_string()]);
        assert!(confirmation.html.contains("$1.99"));
    }

    #[tokio::test]
    async fn test_payment_notification_fails_if_either_fails() {
        let customer = Arc::new(Outbox {
            fail: true,
            ..Outbox::default()
        });
        let ops = Arc::new(Outbox::default());

        let result = notifier(&customer, &ops)
            .send_payment_notification(&notification())
            .await;
        assert!(matches!(result, Err(NotifyError::Send(_))));
        // Both sends were attempted.
        assert_eq!(ops.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_transport() {
        let notifier = Notifier::new(Mailers::default(), Vec::new(), String::new());
        let result = notifier
            .send_vin_request("1HGCM82633A004352", "a@b.co", "Accord", Utc::now())
            .await;
        assert!(matches!(result, Err(NotifyError::NotConfigured("Operations"))));
    }

    #[tokio::test]
    async fn test_user_input_is_escaped() {
        let customer = Arc::new(Outbox::default());
        let ops = Arc::new(Outbox::default());

        notifier(&customer, &ops)
            .send_vin_request(
                "1HGCM82633A004352",
                "a@b.co",
                "<script>alert(1)</script>",
                Utc::now(),
            )
            .await
            .unwrap();

        let sent = ops.sent.lock().unwrap()[0].clone();
        assert!(!sent.html.contains("<script>"));
        assert!(sent.text.unwrap().contains("<script>alert(1)</script>"));
    }

    #[tokio::test]
    async fn test_event_summary() {
        let customer = Arc::new(Outbox::default());
        let ops = Arc::new(Outbox::default());
        let event: WebhookEvent = serde_json::from_str(
            r#"{
                "event_id": "evt_01",
                "event_type": "transaction.completed",
                "data": {
                    "id": "txn_01",
                    "items": [{ "price": { "name": "VIN report", "unit_price": { "amount": "199", "currency_code": "USD" } } }]
                }
            }"#,
        )
        .unwrap();

        notifier(&customer, &ops)
            .send_event_summary(&event)
            .await
            .unwrap();

        let sent = ops.sent.lock().unwrap()[0].clone();
        assert_eq!(sent.subject, "Transaction Completed: txn_01");
        assert!(sent.html.contains("$1.99 USD"));
        assert!(sent.text.unwrap().starts_with("Event: transaction.completed\nData: {"));
    }
}
