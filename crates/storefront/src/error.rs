//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-side errors to
//! Sentry before responding to the client. All JSON route handlers return
//! `Result<T, AppError>`.
//!
//! Every error renders the same JSON shape:
//!
//! ```json
//! { "success": false, "message": "...", "error": "validation_error", "details": "..." }
//! ```
//!
//! Raw payment provider bodies are logged, never returned.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::paddle::ProviderError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad input shape, length or format.
    #[error("{0}")]
    Validation(String),

    /// A required credential or signed artifact was absent from the request.
    #[error("{0}")]
    MissingCredentials(String),

    /// Webhook signature verification failed.
    #[error("{0}")]
    Signature(String),

    /// A server-side integration is not configured.
    #[error("{0}")]
    Configuration(String),

    /// The payment provider rejected our API key.
    #[error("Unauthorized - Invalid API key")]
    UpstreamUnauthorized,

    /// The payment provider has no such resource.
    #[error("{0}")]
    UpstreamNotFound(String),

    /// The payment provider answered with another non-success status.
    #[error("Payment provider returned {status}")]
    Upstream { status: u16, body: String },

    /// Mail could not be sent for an endpoint whose only job is sending mail.
    #[error("{message}")]
    Notification {
        message: String,
        details: Option<String>,
    },

    /// The endpoint does not support the request method.
    #[error("Method Not Allowed")]
    MethodNotAllowed,

    /// Anything else.
    #[error("Internal error: {0}")]
    Unexpected(String),
}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    success: bool,
    message: String,
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a str>,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::MissingCredentials(_) | Self::Signature(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::UpstreamUnauthorized => StatusCode::UNAUTHORIZED,
            Self::UpstreamNotFound(_) => StatusCode::NOT_FOUND,
            Self::Upstream { status, .. } => StatusCode::from_u16(*status)
                .ok()
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::BAD_GATEWAY),
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Configuration(_) | Self::Notification { .. } | Self::Unexpected(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Stable machine-readable error code.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::MissingCredentials(_) => "missing_credentials",
            Self::Signature(_) => "invalid_signature",
            Self::Configuration(_) => "configuration_error",
            Self::UpstreamUnauthorized => "upstream_unauthorized",
            Self::UpstreamNotFound(_) => "upstream_not_found",
            Self::Upstream { .. } => "upstream_error",
            Self::Notification { .. } => "notification_error",
            Self::MethodNotAllowed => "method_not_allowed",
            Self::Unexpected(_) => "unexpected_error",
        }
    }
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotConfigured => {
                Self::Configuration("Missing Paddle API key configuration".to_string())
            }
            ProviderError::Unauthorized => Self::UpstreamUnauthorized,
            ProviderError::NotFound(what) => Self::UpstreamNotFound(format!("{what} not found")),
            ProviderError::Api { status, body } => Self::Upstream { status, body },
            other => Self::Unexpected(other.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        if let Self::Upstream {
            status: upstream,
            body,
        } = &self
        {
            tracing::warn!(status = upstream, body = %body, "Payment provider error");
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Unexpected(_) => "Internal server error".to_string(),
            Self::Upstream { .. } => "Failed to fetch data from the payment provider".to_string(),
            _ => self.to_string(),
        };
        let details = match &self {
            Self::Notification { details, .. } => details.as_deref(),
            _ => None,
        };

        let body = ErrorBody {
            success: false,
            message,
            error: self.kind(),
            details,
        };

        let mut response = (status, Json(body)).into_response();
        if matches!(self, Self::MethodNotAllowed) {
            response
                .headers_mut()
                .insert(header::ALLOW, header::HeaderValue::from_static("POST"));
        }
        response
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("checkout", "Validation rejected", Some(&[("field", "cvv")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::Validation("VIN must be exactly 17 characters".to_string());
        assert_eq!(err.to_string(), "VIN must be exactly 17 characters");

        let err = AppError::UpstreamUnauthorized;
        assert_eq!(err.to_string(), "Unauthorized - Invalid API key");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::Validation("x".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::MissingCredentials("x".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Signature("x".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Configuration("x".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::UpstreamUnauthorized),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::UpstreamNotFound("x".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::MethodNotAllowed),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            get_status(AppError::Unexpected("x".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_upstream_status_passthrough() {
        let err = AppError::Upstream {
            status: 429,
            body: "slow down".to_string(),
        };
        assert_eq!(get_status(err), StatusCode::TOO_MANY_REQUESTS);

        let err = AppError::Upstream {
            status: 302,
            body: String::new(),
        };
        assert_eq!(get_status(err), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_provider_error_mapping() {
        assert!(matches!(
            AppError::from(ProviderError::NotConfigured),
            AppError::Configuration(_)
        ));
        assert!(matches!(
            AppError::from(ProviderError::Unauthorized),
            AppError::UpstreamUnauthorized
        ));
        assert!(matches!(
            AppError::from(ProviderError::NotFound("Transaction")),
            AppError::UpstreamNotFound(ref m) if m == "Transaction not found"
        ));
        assert!(matches!(
            AppError::from(ProviderError::Api {
                status: 500,
                body: "boom".to_string()
            }),
            AppError::Upstream { status: 500, .. }
        ));
    }

    #[tokio::test]
    async fn test_error_body_hides_provider_body() {
        let err = AppError::Upstream {
            status: 503,
            body: "internal provider stack trace".to_string(),
        };
        let response = err.into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "upstream_error");
        assert!(!bytes.windows(5).any(|w| w == b"stack"));
    }

    #[test]
    fn test_method_not_allowed_sets_allow_header() {
        let response = AppError::MethodNotAllowed.into_response();
        assert_eq!(
            response.headers().get(header::ALLOW).unwrap(),
            "POST"
        );
    }
}
