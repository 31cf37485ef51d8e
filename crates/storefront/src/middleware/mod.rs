//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (hub per request, transaction tracing)
//! 2. `TraceLayer` (request spans)
//! 3. Request ID (correlation id on span, scope and response)
//!
//! The webhook route additionally carries its own CORS layer.

pub mod cors;
pub mod request_id;

pub use cors::webhook_cors;
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
