//! CORS for the payment webhook.
//!
//! The provider's dashboard probes the endpoint from a browser, so the
//! webhook answers any origin for `POST` and `OPTIONS` with the signature
//! header allowed.

use axum::http::{HeaderName, Method, header};
use tower_http::cors::{Any, CorsLayer};

use crate::services::paddle::SIGNATURE_HEADER;

/// CORS layer for `/payment-webhook`.
#[must_use]
pub fn webhook_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(SIGNATURE_HEADER)])
}
