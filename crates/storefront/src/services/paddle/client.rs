//! Paddle REST API client.

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;
use wheelstory_core::{CustomerId, TransactionId, TransactionRecord};

use super::types::{Customer, Envelope, Transaction};
use super::{PaymentProvider, ProviderError};

/// Paddle API client for read-only lookups.
#[derive(Clone)]
pub struct PaddleClient {
    client: reqwest::Client,
    base_url: Url,
}

impl PaddleClient {
    /// Create a new Paddle API client.
    ///
    /// # Errors
    ///
    /// Returns error if the base URL is invalid, the API key is not a valid
    /// header value, or the HTTP client fails to build.
    pub fn new(api_key: &SecretString, base_url: &str) -> Result<Self, ProviderError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ProviderError::Parse(format!("Invalid base URL: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ProviderError::Parse(format!(
                "Invalid base URL: {base_url}"
            )));
        }

        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", api_key.expose_secret());
        let mut auth = HeaderValue::from_str(&auth_value)
            .map_err(|e| ProviderError::Parse(format!("Invalid API key format: {e}")))?;
        auth.set_sensitive(true);
        headers.insert("Authorization", auth);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self { client, base_url })
    }

    /// Build `<base>/<collection>/<id>`, percent-encoding the id.
    fn resource_url(&self, collection: &str, id: &str) -> Result<Url, ProviderError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ProviderError::Parse("Base URL cannot hold a path".to_string()))?
            .pop_if_empty()
            .push(collection)
            .push(id);
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        url: Url,
        resource: &'static str,
    ) -> Result<T, ProviderError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        tracing::debug!(status = status.as_u16(), resource, "Paddle API response");

        match status {
            StatusCode::NOT_FOUND => return Err(ProviderError::NotFound(resource)),
            StatusCode::UNAUTHORIZED => return Err(ProviderError::Unauthorized),
            s if !s.is_success() => {
                let body = response.text().await.unwrap_or_default();
                return Err(ProviderError::Api {
                    status: s.as_u16(),
                    body,
                });
            }
            _ => {}
        }

        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;
        Ok(envelope.data)
    }
}

#[async_trait]
impl PaymentProvider for PaddleClient {
    #[instrument(skip(self), fields(transaction_id = %id))]
    async fn transaction(&self, id: &TransactionId) -> Result<TransactionRecord, ProviderError> {
        let url = self.resource_url("transactions", id.as_str())?;
        let transaction: Transaction = self.get(url, "Transaction").await?;
        Ok(transaction.into())
    }

    #[instrument(skip(self), fields(customer_id = %id))]
    async fn customer(&self, id: &CustomerId) -> Result<Customer, ProviderError> {
        let url = self.resource_url("customers", id.as_str())?;
        self.get(url, "Customer").await
    }
}
