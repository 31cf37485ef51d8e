//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                          - Landing page
//! POST /                          - Landing form, redirects to checkout
//! GET  /health                    - Health check
//!
//! # Checkout
//! GET  /checkout/{token}          - Checkout form for a signed order intent
//! POST /checkout/{token}          - Submit the checkout form
//! GET  /api/card-feedback         - Formatted card number + live validation
//!
//! # Payment provider
//! GET  /transaction-lookup        - Transaction by `?transactionId=`
//! POST /transaction-lookup        - Transaction by JSON body
//! POST /payment-webhook           - Signed webhook receiver
//!
//! # Notifications
//! POST /send-reminder             - Scheduled payment reminder
//! POST /send-payment-notification - Operator + customer order mail
//! POST /send-vin-request          - Operator mail for a report request
//! ```

pub mod api;
pub mod checkout;
pub mod home;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::webhook_cors;
use crate::state::AppState;

/// Create the checkout funnel routes.
pub fn funnel_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::landing).post(home::submit))
        .route("/checkout/{token}", get(checkout::show).post(checkout::submit))
        .route("/api/card-feedback", get(api::card::feedback))
}

/// Create the payment provider routes.
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/transaction-lookup",
            get(api::transactions::lookup_get).post(api::transactions::lookup_post),
        )
        .route(
            "/payment-webhook",
            post(api::webhooks::receive)
                .options(api::webhooks::preflight)
                .fallback(api::webhooks::method_not_allowed)
                .layer(webhook_cors()),
        )
}

/// Create the notification routes.
pub fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/send-reminder", post(api::notifications::send_reminder))
        .route(
            "/send-payment-notification",
            post(api::notifications::send_payment_notification),
        )
        .route(
            "/send-vin-request",
            post(api::notifications::send_vin_request),
        )
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(funnel_routes())
        .merge(payment_routes())
        .merge(notification_routes())
}
