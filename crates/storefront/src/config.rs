//! Storefront configuration loaded from environment variables.
//!
//! Loaded once at startup and handed to [`crate::state::AppState`]. Handlers
//! never read the environment themselves.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `STOREFRONT_INTENT_SECRET` - Order intent signing secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_INTENT_TTL_MINUTES` - Order intent lifetime (default: 30)
//! - `CHECKOUT_PROCESSING_DELAY_MS` - Simulated processing delay (default: 2000)
//! - `CHECKOUT_PRICE` - Displayed report price (default: 1.99)
//! - `CHECKOUT_CURRENCY` - Displayed currency symbol (default: $)
//! - `PADDLE_API_KEY` - Paddle API key (transaction and customer lookups)
//! - `PADDLE_WEBHOOK_SECRET` - Paddle webhook endpoint secret
//! - `PADDLE_ENVIRONMENT` - `production` or `sandbox` (default: production)
//! - `PADDLE_API_BASE_URL` - Override the Paddle API base URL
//! - `PADDLE_PAYMENT_LINK` - Hosted checkout link used in reminder emails
//! - `PADDLE_WEBHOOK_MAX_VARIANCE_SECS` - Max webhook timestamp age, 0 disables (default: 5)
//! - `RESEND_API_KEY` - Resend API key (customer mail)
//! - `SMTP_HOST` - SMTP relay host (default: smtp.gmail.com)
//! - `SMTP_PORT` - SMTP relay port (default: 587)
//! - `SMTP_USERNAME` / `SMTP_PASSWORD` - SMTP credentials (operator mail)
//! - `MAIL_FROM` - Sender address (default: support@wheelstory.store)
//! - `MAIL_OPS_RECIPIENTS` - Comma separated operator addresses (default: `MAIL_FROM`)
//! - `REMINDER_DELAY_SECS` - Delay before reminder mail is delivered (default: 60)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Traces sample rate (default: 1.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_INTENT_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Paddle production API.
pub const PADDLE_PRODUCTION_URL: &str = "https://api.paddle.com";
/// Paddle sandbox API.
pub const PADDLE_SANDBOX_URL: &str = "https://sandbox-api.paddle.com";

const DEFAULT_MAIL_FROM: &str = "support@wheelstory.store";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Order intent token settings
    pub intent: IntentConfig,
    /// Checkout page settings
    pub checkout: CheckoutConfig,
    /// Paddle API and webhook settings
    pub paddle: PaddleConfig,
    /// Outbound mail settings
    pub mail: MailConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Order intent token configuration.
///
/// Implements `Debug` manually to redact the signing secret.
#[derive(Clone)]
pub struct IntentConfig {
    /// HMAC key for intent tokens
    pub secret: SecretString,
    /// How long a token stays valid
    pub ttl: Duration,
}

impl std::fmt::Debug for IntentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntentConfig")
            .field("secret", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .finish()
    }
}

/// Checkout page configuration.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// Simulated processing delay before the dispatcher is called
    pub processing_delay: Duration,
    /// Report price shown on the page
    pub price: Decimal,
    /// Currency symbol shown next to the price
    pub currency: String,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            processing_delay: Duration::from_millis(2000),
            price: Decimal::new(199, 2),
            currency: "$".to_string(),
        }
    }
}

/// Paddle configuration.
///
/// Implements `Debug` manually to redact the API key and webhook secret.
#[derive(Clone)]
pub struct PaddleConfig {
    /// API key for server-side lookups
    pub api_key: Option<SecretString>,
    /// Webhook endpoint secret
    pub webhook_secret: Option<SecretString>,
    /// API base URL (production, sandbox or an override)
    pub api_base_url: String,
    /// Hosted checkout link for reminder mail
    pub payment_link: Option<String>,
    /// Reject webhooks whose timestamp is older than this; `None` disables
    pub webhook_max_variance: Option<Duration>,
}

impl Default for PaddleConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            webhook_secret: None,
            api_base_url: PADDLE_PRODUCTION_URL.to_string(),
            payment_link: None,
            webhook_max_variance: Some(Duration::from_secs(5)),
        }
    }
}

impl std::fmt::Debug for PaddleConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaddleConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field(
                "webhook_secret",
                &self.webhook_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("api_base_url", &self.api_base_url)
            .field("payment_link", &self.payment_link)
            .field("webhook_max_variance", &self.webhook_max_variance)
            .finish()
    }
}

/// Outbound mail configuration.
///
/// Implements `Debug` manually to redact the Resend API key.
#[derive(Clone)]
pub struct MailConfig {
    /// Resend API key (customer mail)
    pub resend_api_key: Option<SecretString>,
    /// SMTP relay (operator mail)
    pub smtp: Option<SmtpConfig>,
    /// Sender address (From header)
    pub from_address: String,
    /// Operator inbox(es) for notifications
    pub ops_recipients: Vec<String>,
    /// Delay before a reminder is delivered
    pub reminder_delay: Duration,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            resend_api_key: None,
            smtp: None,
            from_address: DEFAULT_MAIL_FROM.to_string(),
            ops_recipients: vec![DEFAULT_MAIL_FROM.to_string()],
            reminder_delay: Duration::from_secs(60),
        }
    }
}

impl std::fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailConfig")
            .field(
                "resend_api_key",
                &self.resend_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("smtp", &self.smtp)
            .field("from_address", &self.from_address)
            .field("ops_recipients", &self.ops_recipients)
            .field("reminder_delay", &self.reminder_delay)
            .finish()
    }
}

/// SMTP relay configuration.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct SmtpConfig {
    /// SMTP server hostname
    pub host: String,
    /// SMTP server port
    pub port: u16,
    /// SMTP authentication username
    pub username: String,
    /// SMTP authentication password
    pub password: SecretString,
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = parse_env_or_default("STOREFRONT_PORT", 3000_u16)?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?;
        url::Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("STOREFRONT_BASE_URL".to_string(), e.to_string())
        })?;

        let intent = IntentConfig::from_env()?;
        let checkout = CheckoutConfig::from_env()?;
        let paddle = PaddleConfig::from_env()?;
        let mail = MailConfig::from_env()?;

        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            host,
            port,
            base_url,
            intent,
            checkout,
            paddle,
            mail,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl IntentConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let secret = get_validated_secret("STOREFRONT_INTENT_SECRET")?;
        validate_intent_secret(&secret, "STOREFRONT_INTENT_SECRET")?;
        let minutes = parse_env_or_default("STOREFRONT_INTENT_TTL_MINUTES", 30_u64)?;

        Ok(Self {
            secret,
            ttl: ttl_from_minutes(minutes, "STOREFRONT_INTENT_TTL_MINUTES")?,
        })
    }
}

impl CheckoutConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let delay_ms = parse_env_or_default("CHECKOUT_PROCESSING_DELAY_MS", 2000_u64)?;
        let price = parse_env_or_default("CHECKOUT_PRICE", Decimal::new(199, 2))?;

        Ok(Self {
            processing_delay: Duration::from_millis(delay_ms),
            price,
            currency: get_env_or_default("CHECKOUT_CURRENCY", "$"),
        })
    }
}

impl PaddleConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let api_key = get_optional_env("PADDLE_API_KEY")
            .map(|key| {
                validate_secret_strength(&key, "PADDLE_API_KEY")?;
                Ok(SecretString::from(key))
            })
            .transpose()?;
        let webhook_secret = get_optional_env("PADDLE_WEBHOOK_SECRET").map(SecretString::from);

        let api_base_url = match get_optional_env("PADDLE_API_BASE_URL") {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => match get_env_or_default("PADDLE_ENVIRONMENT", "production").as_str() {
                "production" => PADDLE_PRODUCTION_URL.to_string(),
                "sandbox" => PADDLE_SANDBOX_URL.to_string(),
                other => {
                    return Err(ConfigError::InvalidEnvVar(
                        "PADDLE_ENVIRONMENT".to_string(),
                        format!("expected 'production' or 'sandbox', got '{other}'"),
                    ));
                }
            },
        };

        let variance_secs = parse_env_or_default("PADDLE_WEBHOOK_MAX_VARIANCE_SECS", 5_u64)?;
        let webhook_max_variance = (variance_secs > 0).then(|| Duration::from_secs(variance_secs));

        Ok(Self {
            api_key,
            webhook_secret,
            api_base_url,
            payment_link: get_optional_env("PADDLE_PAYMENT_LINK"),
            webhook_max_variance,
        })
    }
}

impl MailConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let resend_api_key = get_optional_env("RESEND_API_KEY").map(SecretString::from);
        let smtp = SmtpConfig::from_env()?;
        let from_address = get_env_or_default("MAIL_FROM", DEFAULT_MAIL_FROM);

        let ops_recipients = get_optional_env("MAIL_OPS_RECIPIENTS").map_or_else(
            || vec![from_address.clone()],
            |list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            },
        );
        if ops_recipients.is_empty() {
            return Err(ConfigError::InvalidEnvVar(
                "MAIL_OPS_RECIPIENTS".to_string(),
                "must list at least one address".to_string(),
            ));
        }

        let reminder_secs = parse_env_or_default("REMINDER_DELAY_SECS", 60_u64)?;

        Ok(Self {
            resend_api_key,
            smtp,
            from_address,
            ops_recipients,
            reminder_delay: Duration::from_secs(reminder_secs),
        })
    }
}

impl SmtpConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let username = get_optional_env("SMTP_USERNAME");
        let password = get_optional_env("SMTP_PASSWORD");

        match (username, password) {
            (Some(username), Some(password)) => Ok(Some(Self {
                host: get_env_or_default("SMTP_HOST", "smtp.gmail.com"),
                port: parse_env_or_default("SMTP_PORT", 587_u16)?,
                username,
                password: SecretString::from(password),
            })),
            (None, None) => Ok(None),
            _ => Err(ConfigError::InvalidEnvVar(
                "SMTP_*".to_string(),
                "Both SMTP_USERNAME and SMTP_PASSWORD must be set together".to_string(),
            )),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_optional_env(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// Convert a minute count from the environment into a [`Duration`].
fn ttl_from_minutes(minutes: u64, key: &str) -> Result<Duration, ConfigError> {
    minutes.checked_mul(60).map(Duration::from_secs).ok_or_else(|| {
        ConfigError::InvalidEnvVar(key.to_string(), format!("{minutes} minutes is too large"))
    })
}

/// Validate that the intent secret meets minimum length requirements.
fn validate_intent_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_INTENT_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_INTENT_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        // "ab" has entropy of 1 bit per char
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-intent-key-here", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_intent_secret_length() {
        let short = SecretString::from("short");
        assert!(validate_intent_secret(&short, "TEST_INTENT").is_err());

        let long = SecretString::from("a".repeat(32));
        assert!(validate_intent_secret(&long, "TEST_INTENT").is_ok());
    }

    #[test]
    fn test_parse_env_or_default_uses_default_when_unset() {
        let value = parse_env_or_default("WHEELSTORY_TEST_SURELY_UNSET_VAR", 42_u64).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_ttl_from_minutes() {
        let ttl = ttl_from_minutes(30, "TEST_TTL").unwrap();
        assert_eq!(ttl, Duration::from_secs(1800));

        let result = ttl_from_minutes(u64::MAX, "TEST_TTL");
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(ref key, _)) if key == "TEST_TTL"));
    }

    #[test]
    fn test_defaults() {
        let checkout = CheckoutConfig::default();
        assert_eq!(checkout.price.to_string(), "1.99");
        assert_eq!(checkout.processing_delay, Duration::from_millis(2000));

        let paddle = PaddleConfig::default();
        assert_eq!(paddle.api_base_url, PADDLE_PRODUCTION_URL);
        assert_eq!(paddle.webhook_max_variance, Some(Duration::from_secs(5)));

        let mail = MailConfig::default();
        assert_eq!(mail.ops_recipients, vec![DEFAULT_MAIL_FROM.to_string()]);
        assert_eq!(mail.reminder_delay, Duration::from_secs(60));
    }

    #[test]
    fn test_socket_addr() {
        let config = StorefrontConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            intent: IntentConfig {
                secret: SecretString::from("x".repeat(32)),
                ttl: Duration::from_secs(1800),
            },
            checkout: CheckoutConfig::default(),
            paddle: PaddleConfig::default(),
            mail: MailConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 1.0,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let paddle = PaddleConfig {
            api_key: Some(SecretString::from("pdl_live_apikey_super_secret")),
            webhook_secret: Some(SecretString::from("pdl_ntfset_super_secret")),
            ..PaddleConfig::default()
        };
        let smtp = SmtpConfig {
            host: "smtp.gmail.com".to_string(),
            port: 587,
            username: "ops@wheelstory.store".to_string(),
            password: SecretString::from("super_secret_smtp_password"),
        };
        let intent = IntentConfig {
            secret: SecretString::from("super_secret_intent_key"),
            ttl: Duration::from_secs(60),
        };

        let debug_output = format!("{paddle:?} {smtp:?} {intent:?}");

        assert!(debug_output.contains("api.paddle.com"));
        assert!(debug_output.contains("ops@wheelstory.store"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret"));
    }
}
