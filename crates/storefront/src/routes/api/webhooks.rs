//! Payment provider webhook receiver.
//!
//! POST /payment-webhook
//!
//! The signature is checked against the raw body bytes before anything is
//! parsed. Once verified, the event is always acknowledged with 200; mail
//! failures are logged and never turned into an error response, so the
//! provider does not redeliver because of them.
//!
//! Duplicate deliveries of the same event are processed again.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use serde::Serialize;
use tracing::instrument;
use wheelstory_core::{CustomerId, Price, WebhookEvent};

use crate::error::{AppError, Result};
use crate::services::paddle::SIGNATURE_HEADER;
use crate::state::AppState;

/// Name used when the provider has none on file.
const FALLBACK_CUSTOMER_NAME: &str = "Valued Customer";

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub ok: bool,
    pub event: String,
    pub id: Option<String>,
}

/// Receive one signed notification.
#[instrument(skip(state, headers, body), fields(body_len = body.len()))]
pub async fn receive(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty());

    let Some(signature) = signature.filter(|_| !body.is_empty()) else {
        tracing::warn!(
            has_signature = headers.contains_key(SIGNATURE_HEADER),
            has_body = !body.is_empty(),
            "Webhook missing signature or body"
        );
        return Err(AppError::MissingCredentials(
            "Signature or body missing".to_string(),
        ));
    };

    let Some(verifier) = state.verifier() else {
        tracing::error!("Webhook secret is not configured");
        return Err(AppError::Configuration(
            "Server configuration error".to_string(),
        ));
    };

    if let Err(e) = verifier.verify(signature, &body) {
        tracing::warn!(error = %e, "Webhook verification failed");
        return Err(AppError::Signature("Invalid webhook signature".to_string()));
    }

    let event: WebhookEvent = serde_json::from_slice(&body).map_err(|e| {
        tracing::warn!(error = %e, "Verified webhook body is not a valid event");
        AppError::Validation("Invalid webhook payload".to_string())
    })?;

    tracing::info!(
        event_type = %event.event_type,
        event_id = event.event_id.as_deref().unwrap_or_default(),
        "Webhook verified"
    );

    if event.event_type.is_payment_completed() {
        notify_customer(&state, &event).await;
    }

    match state.notifier().send_event_summary(&event).await {
        Ok(id) => tracing::info!(message_id = %id, "Event summary sent"),
        Err(e) => tracing::error!(error = %e, "Event summary email failed"),
    }

    Ok(Json(WebhookAck {
        ok: true,
        event: event.event_type.to_string(),
        id: event.event_id,
    }))
}

/// Send the "payment successful" email to the paying customer.
///
/// Every failure here is logged and skipped.
async fn notify_customer(state: &AppState, event: &WebhookEvent) {
    let data = &event.data;
    let Some(raw_customer_id) = data.customer_id.as_deref() else {
        tracing::info!("Payment event has no customer id");
        return;
    };
    let customer_id = match CustomerId::parse(raw_customer_id) {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!(error = %e, "Payment event has an invalid customer id");
            return;
        }
    };
    let Some(provider) = state.provider() else {
        tracing::warn!("Payment provider not configured; skipping customer email");
        return;
    };

    let customer = match provider.customer(&customer_id).await {
        Ok(customer) => customer,
        Err(e) => {
            tracing::error!(customer_id = %customer_id, error = %e, "Failed to fetch customer");
            return;
        }
    };
    let Some(email) = customer.email.as_deref().filter(|e| !e.is_empty()) else {
        tracing::info!(customer_id = %customer_id, "Customer has no email address");
        return;
    };

    let name = customer
        .name
        .as_deref()
        .filter(|n| !n.is_empty())
        .unwrap_or(FALLBACK_CUSTOMER_NAME);
    let price = data
        .first_item_price()
        .unwrap_or_else(|| Price::from_minor_units("0", None));
    let transaction_id = data.id.as_deref().unwrap_or_default();

    match state
        .notifier()
        .send_payment_success(email, name, transaction_id, data.product_name(), &price)
        .await
    {
        Ok(id) => tracing::info!(message_id = %id, "Payment success email sent"),
        Err(e) => tracing::error!(error = %e, "Payment success email failed"),
    }
}

/// OPTIONS /payment-webhook
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

/// Any other method on /payment-webhook.
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
