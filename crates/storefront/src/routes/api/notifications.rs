//! Mail notification endpoints.
//!
//! ```text
//! POST /send-reminder              - Schedule a "payment pending" reminder
//! POST /send-payment-notification  - Operator order mail + customer confirmation
//! POST /send-vin-request           - Operator mail for a new report request
//! ```

use axum::{Json, extract::State};
use chrono::{SecondsFormat, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use wheelstory_core::{Email, OrderIntent, PaymentFormData};

use crate::error::{AppError, Result};
use crate::extract::ApiJson;
use crate::services::{MessageId, NotifyError, OrderData, PaymentNotification, SendError};
use crate::state::AppState;

/// Body of `/send-reminder` and `/send-vin-request`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VinRequest {
    pub vin: String,
    pub email: String,
    pub car_model: String,
}

/// Body of `/send-payment-notification`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentNotificationRequest {
    pub customer_email: Option<String>,
    pub customer_name: Option<String>,
    pub transaction_id: Option<String>,
    pub vin: Option<String>,
    pub car_model: Option<String>,
    pub amount: Option<String>,
    pub currency: Option<String>,
    pub form_data: Option<PaymentFormData>,
    pub order_data: Option<OrderData>,
}

#[derive(Debug, Serialize)]
pub struct ReminderData {
    pub id: MessageId,
}

#[derive(Debug, Serialize)]
pub struct ReminderResponse {
    pub success: bool,
    pub message: &'static str,
    pub data: ReminderData,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentNotificationResponse {
    pub success: bool,
    pub message: &'static str,
    pub notification_id: MessageId,
    pub customer_id: MessageId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VinRequestResponse {
    pub success: bool,
    pub message: &'static str,
    pub admin_message_id: MessageId,
    pub timestamp: String,
}

/// Operator hint for a failed send.
fn send_hint(err: &NotifyError) -> String {
    match err {
        NotifyError::Send(SendError::Smtp(e)) if e.is_permanent() => {
            "The SMTP server rejected the request. Check SMTP_USERNAME and SMTP_PASSWORD \
             (Gmail requires an app password)."
                .to_string()
        }
        NotifyError::Send(SendError::Smtp(e)) if e.is_transient() => {
            "Temporary SMTP failure. This might be a temporary issue.".to_string()
        }
        other => other.to_string(),
    }
}

/// Map a notifier failure to the endpoint's error.
fn notify_error(err: NotifyError, missing: &str, failed: &str) -> AppError {
    match err {
        NotifyError::NotConfigured(_) => AppError::Configuration(missing.to_string()),
        other => {
            let details = send_hint(&other);
            AppError::Notification {
                message: failed.to_string(),
                details: Some(details),
            }
        }
    }
}

/// POST /send-reminder
#[instrument(skip(state, body), fields(vin = %body.vin))]
pub async fn send_reminder(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<VinRequest>,
) -> Result<Json<ReminderResponse>> {
    let email = Email::parse(body.email.trim())
        .map_err(|_| AppError::Validation("Please provide a valid email address".to_string()))?;

    let delay = TimeDelta::from_std(state.config().mail.reminder_delay).unwrap_or_default();
    let deliver_at = Utc::now() + delay;
    let id = state
        .notifier()
        .send_reminder(email.as_str(), &body.vin, deliver_at)
        .await
        .map_err(|e| {
            notify_error(
                e,
                "Missing Resend API key configuration",
                "Failed to send reminder mail",
            )
        })?;

    tracing::info!(message_id = %id, %deliver_at, "Reminder mail scheduled");
    Ok(Json(ReminderResponse {
        success: true,
        message: "Reminder mail sent successfully",
        data: ReminderData { id },
    }))
}

/// POST /send-payment-notification
#[instrument(skip(state, body))]
pub async fn send_payment_notification(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<PaymentNotificationRequest>,
) -> Result<Json<PaymentNotificationResponse>> {
    let present = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
    let (Some(customer_email), Some(customer_name), Some(vin)) = (
        present(body.customer_email),
        present(body.customer_name),
        present(body.vin),
    ) else {
        return Err(AppError::Validation(
            "Missing required fields: customerEmail, customerName, or vin".to_string(),
        ));
    };

    let now = Utc::now();
    let notification = PaymentNotification {
        customer_email,
        customer_name,
        transaction_id: present(body.transaction_id)
            .unwrap_or_else(|| format!("TXN-{}", now.timestamp_millis())),
        vin,
        car_model: present(body.car_model),
        amount: present(body.amount).unwrap_or_else(|| "1.99".to_string()),
        currency: present(body.currency).unwrap_or_else(|| "$".to_string()),
        form_data: body.form_data,
        order_data: body.order_data,
        ordered_at: now,
    };

    let receipt = state
        .notifier()
        .send_payment_notification(&notification)
        .await
        .map_err(|e| {
            notify_error(
                e,
                "Missing email credentials",
                "Failed to send payment notification email",
            )
        })?;

    tracing::info!(
        notification_id = %receipt.notification_id,
        customer_id = %receipt.customer_id,
        "Payment notification emails sent"
    );
    Ok(Json(PaymentNotificationResponse {
        success: true,
        message: "Payment notification emails sent successfully",
        notification_id: receipt.notification_id,
        customer_id: receipt.customer_id,
    }))
}

/// POST /send-vin-request
#[instrument(skip(state, body), fields(vin = %body.vin))]
pub async fn send_vin_request(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<VinRequest>,
) -> Result<Json<VinRequestResponse>> {
    let now = Utc::now();
    let request = OrderIntent::new(&body.vin, &body.email, &body.car_model, now)
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let id = state
        .notifier()
        .send_vin_request(
            request.vin.as_str(),
            request.email.as_str(),
            &request.car_model,
            now,
        )
        .await
        .map_err(|e| notify_error(e, "Missing email credentials", "Failed to send VIN request"))?;

    tracing::info!(message_id = %id, "VIN request sent to operators");
    Ok(Json(VinRequestResponse {
        success: true,
        message: "VIN report request submitted successfully. You will receive your report within 6-12 hours.",
        admin_message_id: id,
        timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}
