//! Outbound mail behind one capability interface.
//!
//! Two transports implement [`Mailer`]:
//!
//! - [`SmtpMailer`] - SMTP relay via lettre, used for operator notifications
//! - [`ResendMailer`] - Resend HTTP API, used for customer mail (supports
//!   scheduled delivery)
//!
//! Callers build an [`OutgoingEmail`] and never see which transport is used.

pub mod resend;
pub mod smtp;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::config::MailConfig;

pub use resend::ResendMailer;
pub use smtp::SmtpMailer;

/// A message ready to hand to a transport.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: Vec<String>,
    pub bcc: Vec<String>,
    pub subject: String,
    pub html: String,
    /// Plain text alternative, if any.
    pub text: Option<String>,
    /// Deliver no earlier than this. Only some transports support it.
    pub scheduled_at: Option<DateTime<Utc>>,
}

impl OutgoingEmail {
    /// An HTML message to `to` with no alternative part.
    #[must_use]
    pub fn html(to: Vec<String>, subject: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            to,
            subject: subject.into(),
            html: html.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    #[must_use]
    pub fn with_bcc(mut self, bcc: Vec<String>) -> Self {
        self.bcc = bcc;
        self
    }

    #[must_use]
    pub const fn scheduled_at(mut self, at: DateTime<Utc>) -> Self {
        self.scheduled_at = Some(at);
        self
    }
}

/// Transport-assigned message identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(transparent)]
pub struct MessageId(pub String);

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Errors that can occur when sending mail.
#[derive(Debug, Error)]
pub enum SendError {
    /// A sender or recipient address could not be parsed.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// The API key cannot be sent as a header.
    #[error("Invalid API key format")]
    InvalidApiKey,

    /// The message has no recipients.
    #[error("Message has no recipients")]
    NoRecipients,

    /// The transport cannot honour a requested feature.
    #[error("Transport does not support {0}")]
    Unsupported(&'static str),

    /// Failed to build the MIME message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    /// HTTP request to a mail API failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Mail API returned an error response.
    #[error("Mail API error: {status} - {message}")]
    Api { status: u16, message: String },
}

/// Anything that can deliver an [`OutgoingEmail`].
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send one message.
    ///
    /// # Errors
    ///
    /// Returns `SendError` if the message is rejected or delivery fails.
    async fn send(&self, email: OutgoingEmail) -> Result<MessageId, SendError>;
}

/// The two mail roles the storefront uses.
///
/// Either may be absent when its credentials are not configured.
#[derive(Clone, Default)]
pub struct Mailers {
    /// Mail addressed to customers.
    pub customer: Option<Arc<dyn Mailer>>,
    /// Mail addressed to the operators.
    pub operations: Option<Arc<dyn Mailer>>,
}

impl Mailers {
    /// Build whichever transports have credentials.
    ///
    /// Resend carries customer mail, SMTP carries operator mail.
    ///
    /// # Errors
    ///
    /// Returns `SendError` if a configured transport cannot be constructed.
    pub fn from_config(config: &MailConfig) -> Result<Self, SendError> {
        let customer = config
            .resend_api_key
            .as_ref()
            .map(|key| ResendMailer::new(key, config.from_address.clone()))
            .transpose()?
            .map(|m| Arc::new(m) as Arc<dyn Mailer>);

        let operations = config
            .smtp
            .as_ref()
            .map(|smtp| SmtpMailer::new(smtp, &config.from_address))
            .transpose()?
            .map(|m| Arc::new(m) as Arc<dyn Mailer>);

        Ok(Self {
            customer,
            operations,
        })
    }
}

impl std::fmt::Debug for Mailers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mailers")
            .field("customer", &self.customer.is_some())
            .field("operations", &self.operations.is_some())
            .finish()
    }
}
