//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::StorefrontConfig;
use crate::services::{
    IntentSigner, Mailers, NotificationDispatcher, Notifier, PaddleClient, PaymentProvider,
    ProviderError, SendError, WebhookVerifier,
};

/// Error building application state from configuration.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("mail transport: {0}")]
    Mail(#[from] SendError),
    #[error("payment provider: {0}")]
    Provider(#[from] ProviderError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. Integrations whose credentials
/// are absent are `None`; handlers that need them answer with a configuration
/// error.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    notifier: Notifier,
    dispatcher: Arc<dyn NotificationDispatcher>,
    provider: Option<Arc<dyn PaymentProvider>>,
    verifier: Option<WebhookVerifier>,
    intents: IntentSigner,
}

impl AppState {
    /// Build state with the real transports and provider client.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured client cannot be constructed.
    pub fn new(config: StorefrontConfig) -> Result<Self, StateError> {
        let mailers = Mailers::from_config(&config.mail)?;

        let provider = config
            .paddle
            .api_key
            .as_ref()
            .map(|key| PaddleClient::new(key, &config.paddle.api_base_url))
            .transpose()?
            .map(|client| Arc::new(client) as Arc<dyn PaymentProvider>);

        Ok(Self::with_services(config, mailers, provider, None))
    }

    /// Build state around injected collaborators.
    ///
    /// `dispatcher` defaults to the notifier built from `mailers`.
    #[must_use]
    pub fn with_services(
        config: StorefrontConfig,
        mailers: Mailers,
        provider: Option<Arc<dyn PaymentProvider>>,
        dispatcher: Option<Arc<dyn NotificationDispatcher>>,
    ) -> Self {
        let payment_link = config
            .paddle
            .payment_link
            .clone()
            .unwrap_or_else(|| config.base_url.clone());
        let notifier = Notifier::new(mailers, config.mail.ops_recipients.clone(), payment_link);
        let dispatcher = dispatcher.unwrap_or_else(|| Arc::new(notifier.clone()));

        let verifier = config
            .paddle
            .webhook_secret
            .clone()
            .map(|secret| WebhookVerifier::new(secret, config.paddle.webhook_max_variance));
        let intents = IntentSigner::new(config.intent.secret.clone(), config.intent.ttl);

        tracing::info!(
            customer_mail = notifier.has_customer_mailer(),
            operations_mail = notifier.has_operations_mailer(),
            payment_provider = provider.is_some(),
            webhook_secret = verifier.is_some(),
            "Integrations configured"
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                notifier,
                dispatcher,
                provider,
                verifier,
                intents,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn notifier(&self) -> &Notifier {
        &self.inner.notifier
    }

    /// Receiver of accepted checkout submissions.
    #[must_use]
    pub fn dispatcher(&self) -> &dyn NotificationDispatcher {
        self.inner.dispatcher.as_ref()
    }

    /// Payment provider client, if an API key is configured.
    #[must_use]
    pub fn provider(&self) -> Option<&dyn PaymentProvider> {
        self.inner.provider.as_deref()
    }

    /// Webhook verifier, if a webhook secret is configured.
    #[must_use]
    pub fn verifier(&self) -> Option<&WebhookVerifier> {
        self.inner.verifier.as_ref()
    }

    #[must_use]
    pub fn intents(&self) -> &IntentSigner {
        &self.inner.intents
    }
}
