//! Resend HTTP API transport.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::{Mailer, MessageId, OutgoingEmail, SendError};

/// Resend API base URL.
const BASE_URL: &str = "https://api.resend.com";

/// Sends mail through the Resend API.
#[derive(Clone)]
pub struct ResendMailer {
    client: reqwest::Client,
    base_url: String,
    from: String,
}

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a [String],
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    bcc: &'a [String],
    subject: &'a str,
    html: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scheduled_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SendEmailResponse {
    id: String,
}

impl ResendMailer {
    /// Create a new Resend client.
    ///
    /// # Errors
    ///
    /// Returns error if the API key is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(api_key: &SecretString, from: impl Into<String>) -> Result<Self, SendError> {
        Self::with_base_url(api_key, from, BASE_URL)
    }

    /// Create a client against a non-default API host.
    ///
    /// # Errors
    ///
    /// Same as [`ResendMailer::new`].
    pub fn with_base_url(
        api_key: &SecretString,
        from: impl Into<String>,
        base_url: &str,
    ) -> Result<Self, SendError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", api_key.expose_secret());
        let mut auth = HeaderValue::from_str(&auth_value)
            .map_err(|_| SendError::InvalidApiKey)?;
        auth.set_sensitive(true);
        headers.insert("Authorization", auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            from: from.into(),
        })
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<MessageId, SendError> {
        if email.to.is_empty() {
            return Err(SendError::NoRecipients);
        }

        let body = SendEmailRequest {
            from: &self.from,
            to: &email.to,
            bcc: &email.bcc,
            subject: &email.subject,
            html: &email.html,
            text: email.text.as_deref(),
            scheduled_at: email.scheduled_at.map(|at| at.to_rfc3339()),
        };

        let url = format!("{}/emails", self.base_url);
        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SendError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let sent: SendEmailResponse = response.json().await?;

        tracing::info!(
            subject = %email.subject,
            message_id = %sent.id,
            scheduled = email.scheduled_at.is_some(),
            "Email sent via Resend"
        );
        Ok(MessageId(sent.id))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let to = vec!["buyer@example.com".to_string()];
        let body = SendEmailRequest {
            from: "support@wheelstory.store",
            to: &to,
            bcc: &[],
            subject: "Payment Successful",
            html: "<p>ok</p>",
            text: None,
            scheduled_at: Some("2026-10-19T10:01:00+00:00".to_string()),
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["to"][0], "buyer@example.com");
        assert_eq!(json["scheduled_at"], "2026-10-19T10:01:00+00:00");
        assert!(json.get("bcc").is_none());
        assert!(json.get("text").is_none());
    }

    #[tokio::test]
    async fn test_send_requires_recipient() {
        let mailer =
            ResendMailer::new(&SecretString::from("re_test_key"), "support@wheelstory.store")
                .unwrap();
        let result = mailer.send(OutgoingEmail::default()).await;
        assert!(matches!(result, Err(SendError::NoRecipients)));
    }
}
