//! Integration tests for the WheelStory storefront.
//!
//! Tests drive the full router with `tower::ServiceExt::oneshot`, so no server
//! or network access is needed. Mail transports, the payment provider and the
//! checkout dispatcher are replaced by the recording fakes in this crate.
//!
//! ```bash
//! cargo test -p wheelstory-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;
use wheelstory_core::{CustomerId, TransactionId, TransactionRecord};
use wheelstory_storefront::{
    app,
    config::{CheckoutConfig, IntentConfig, MailConfig, PaddleConfig, StorefrontConfig},
    services::{
        Mailer, Mailers, MessageId, NotificationDispatcher, NotificationReceipt, NotifyError,
        OutgoingEmail, PaymentNotification, PaymentProvider, ProviderError, SendError,
        paddle::Customer,
    },
    state::AppState,
};

/// Webhook secret used by [`test_config`].
pub const WEBHOOK_SECRET: &str = "pdl_ntfset_integration_test_secret";

/// Operator inbox used by [`test_config`].
pub const OPS_INBOX: &str = "ops@wheelstory.test";

/// A VIN with a valid check digit.
pub const VALID_VIN: &str = "1HGCM82633A004352";

/// Configuration with every integration enabled and no artificial delays.
#[must_use]
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        base_url: "http://localhost:3000".to_string(),
        intent: IntentConfig {
            secret: SecretString::from("kQ9vT2mXz7LbR4wNc8HjP3sYd6FgA1eU"),
            ttl: Duration::from_secs(1800),
        },
        checkout: CheckoutConfig {
            processing_delay: Duration::ZERO,
            ..CheckoutConfig::default()
        },
        paddle: PaddleConfig {
            webhook_secret: Some(SecretString::from(WEBHOOK_SECRET)),
            payment_link: Some("https://pay.wheelstory.test/checkout".to_string()),
            ..PaddleConfig::default()
        },
        mail: MailConfig {
            ops_recipients: vec![OPS_INBOX.to_string()],
            ..MailConfig::default()
        },
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
    }
}

// =============================================================================
// Fakes
// =============================================================================

/// Mailer that records every message instead of sending it.
#[derive(Default)]
pub struct Outbox {
    sent: Mutex<Vec<OutgoingEmail>>,
    fail: bool,
}

impl Outbox {
    /// An outbox whose every send fails.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for Outbox {
    async fn send(&self, email: OutgoingEmail) -> Result<MessageId, SendError> {
        if self.fail {
            return Err(SendError::Api {
                status: 503,
                message: "outbox unavailable".to_string(),
            });
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push(email);
        Ok(MessageId(format!("msg_{}", sent.len())))
    }
}

/// Payment provider backed by in-memory maps.
#[derive(Default)]
pub struct FakeProvider {
    pub transactions: HashMap<String, TransactionRecord>,
    pub customers: HashMap<String, Customer>,
    calls: AtomicUsize,
}

impl FakeProvider {
    /// Number of lookups made so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentProvider for FakeProvider {
    async fn transaction(&self, id: &TransactionId) -> Result<TransactionRecord, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.transactions
            .get(id.as_str())
            .cloned()
            .ok_or(ProviderError::NotFound("Transaction"))
    }

    async fn customer(&self, id: &CustomerId) -> Result<Customer, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.customers
            .get(id.as_str())
            .cloned()
            .ok_or(ProviderError::NotFound("Customer"))
    }
}

/// Checkout dispatcher that counts calls and remembers the last VIN.
#[derive(Default)]
pub struct CountingDispatcher {
    calls: AtomicUsize,
    last_vin: Mutex<Option<String>>,
    fail: bool,
}

impl CountingDispatcher {
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn last_vin(&self) -> Option<String> {
        self.last_vin.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationDispatcher for CountingDispatcher {
    async fn dispatch(
        &self,
        notification: PaymentNotification,
    ) -> Result<NotificationReceipt, NotifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_vin.lock().unwrap() = Some(notification.vin);
        if self.fail {
            return Err(NotifyError::NotConfigured("Customer"));
        }
        Ok(NotificationReceipt {
            notification_id: MessageId("ops_1".to_string()),
            customer_id: MessageId("cus_1".to_string()),
        })
    }
}

// =============================================================================
// Test context
// =============================================================================

/// The router plus handles on every fake behind it.
pub struct TestContext {
    pub router: Router,
    pub customer_mail: Arc<Outbox>,
    pub ops_mail: Arc<Outbox>,
    pub provider: Arc<FakeProvider>,
    pub dispatcher: Arc<CountingDispatcher>,
}

/// Which collaborators a [`TestContext`] is built with.
pub struct TestSetup {
    pub config: StorefrontConfig,
    pub customer_mail: Option<Outbox>,
    pub ops_mail: Option<Outbox>,
    pub provider: Option<FakeProvider>,
    pub dispatcher: CountingDispatcher,
}

impl Default for TestSetup {
    fn default() -> Self {
        Self {
            config: test_config(),
            customer_mail: Some(Outbox::default()),
            ops_mail: Some(Outbox::default()),
            provider: Some(FakeProvider::default()),
            dispatcher: CountingDispatcher::default(),
        }
    }
}

impl TestSetup {
    /// No mail transports and no payment provider.
    #[must_use]
    pub fn bare() -> Self {
        Self {
            customer_mail: None,
            ops_mail: None,
            provider: None,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn build(self) -> TestContext {
        let configured = (
            self.customer_mail.is_some(),
            self.ops_mail.is_some(),
            self.provider.is_some(),
        );
        let customer_mail = Arc::new(self.customer_mail.unwrap_or_default());
        let ops_mail = Arc::new(self.ops_mail.unwrap_or_default());
        let provider = Arc::new(self.provider.unwrap_or_default());
        let dispatcher = Arc::new(self.dispatcher);

        let mailers = Mailers {
            customer: configured
                .0
                .then(|| Arc::clone(&customer_mail) as Arc<dyn Mailer>),
            operations: configured.1.then(|| Arc::clone(&ops_mail) as Arc<dyn Mailer>),
        };
        let state = AppState::with_services(
            self.config,
            mailers,
            configured
                .2
                .then(|| Arc::clone(&provider) as Arc<dyn PaymentProvider>),
            Some(Arc::clone(&dispatcher) as Arc<dyn NotificationDispatcher>),
        );

        TestContext {
            router: app(state),
            customer_mail,
            ops_mail,
            provider,
            dispatcher,
        }
    }
}

/// A response reduced to what tests assert on.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    #[must_use]
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap()
    }

    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }
}

impl TestContext {
    /// Everything configured.
    #[must_use]
    pub fn new() -> Self {
        TestSetup::default().build()
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        TestResponse {
            status,
            headers,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post_json(&self, uri: &str, body: &Value) -> TestResponse {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    pub async fn post_form(&self, uri: &str, fields: &[(&str, &str)]) -> TestResponse {
        let encoded = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(encoded))
            .unwrap();
        self.send(request).await
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
