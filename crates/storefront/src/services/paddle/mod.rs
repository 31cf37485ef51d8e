//! Paddle Billing integration.
//!
//! - [`client`] - REST client for transaction and customer lookups
//! - [`types`] - API response shapes and their conversion to display records
//! - [`webhook`] - `Paddle-Signature` verification

pub mod client;
pub mod types;
pub mod webhook;

use async_trait::async_trait;
use thiserror::Error;
use wheelstory_core::{CustomerId, TransactionId, TransactionRecord};

pub use client::PaddleClient;
pub use types::Customer;
pub use webhook::{SIGNATURE_HEADER, SignatureError, WebhookVerifier};

/// Errors that can occur when talking to the payment provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// No API key is configured.
    #[error("Paddle API key is not configured")]
    NotConfigured,

    /// The API key was rejected.
    #[error("Paddle rejected the API key")]
    Unauthorized,

    /// The requested resource does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Any other non-success response. `body` is kept for operators.
    #[error("API error: {status} - {body}")]
    Api { status: u16, body: String },

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Failed to build a request or parse a response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Read-only access to payment provider records.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Fetch a transaction and reshape it for display.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` on non-success responses or transport failure.
    async fn transaction(&self, id: &TransactionId) -> Result<TransactionRecord, ProviderError>;

    /// Fetch a customer.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` on non-success responses or transport failure.
    async fn customer(&self, id: &CustomerId) -> Result<Customer, ProviderError>;
}
