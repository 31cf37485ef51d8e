//! Signed order intent tokens.
//!
//! The landing form hands the validated [`OrderIntent`] to the checkout page
//! through the URL instead of client-side storage. A token is
//! `base64url(json) "." base64url(hmac_sha256(json))`, where the JSON carries
//! the intent and an absolute expiry.

use std::time::Duration;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use wheelstory_core::OrderIntent;

type HmacSha256 = Hmac<Sha256>;

/// Errors that can occur when issuing or opening a token.
#[derive(Debug, Error)]
pub enum IntentError {
    #[error("Malformed intent token")]
    Malformed,

    #[error("Intent token signature mismatch")]
    BadSignature,

    #[error("Intent token expired at {0}")]
    Expired(DateTime<Utc>),

    #[error("Failed to encode intent: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Serialize, Deserialize)]
struct Claims {
    intent: OrderIntent,
    exp: DateTime<Utc>,
}

/// Issues and opens intent tokens.
#[derive(Clone)]
pub struct IntentSigner {
    secret: SecretString,
    ttl: Duration,
}

impl std::fmt::Debug for IntentSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntentSigner")
            .field("secret", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl IntentSigner {
    #[must_use]
    pub const fn new(secret: SecretString, ttl: Duration) -> Self {
        Self { secret, ttl }
    }

    fn mac(&self) -> HmacSha256 {
        <HmacSha256 as Mac>::new_from_slice(self.secret.expose_secret().as_bytes())
            .unwrap_or_else(|_| unreachable!("HMAC-SHA256 accepts any key length"))
    }

    /// Sign `intent`, expiring `ttl` after its creation time.
    ///
    /// # Errors
    ///
    /// Returns `IntentError::Encode` if the intent cannot be serialized.
    pub fn issue(&self, intent: &OrderIntent) -> Result<String, IntentError> {
        let ttl = chrono::Duration::from_std(self.ttl).unwrap_or(chrono::Duration::MAX);
        let claims = Claims {
            intent: intent.clone(),
            exp: intent.created_at.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
        };
        let payload = serde_json::to_vec(&claims)?;

        let mut mac = self.mac();
        mac.update(&payload);
        let signature = mac.finalize().into_bytes();

        Ok(format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(&payload),
            URL_SAFE_NO_PAD.encode(signature)
        ))
    }

    /// Open a token as of now.
    ///
    /// # Errors
    ///
    /// See [`IntentSigner::open_at`].
    pub fn open(&self, token: &str) -> Result<OrderIntent, IntentError> {
        self.open_at(token, Utc::now())
    }

    /// Open a token as of `now`.
    ///
    /// # Errors
    ///
    /// Returns `Malformed` for anything that is not two base64url parts,
    /// `BadSignature` if the MAC does not match and `Expired` once `now` is
    /// past the expiry.
    pub fn open_at(&self, token: &str, now: DateTime<Utc>) -> Result<OrderIntent, IntentError> {
        let (payload, signature) = token.split_once('.').ok_or(IntentError::Malformed)?;
        let payload = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| IntentError::Malformed)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| IntentError::Malformed)?;

        let mut mac = self.mac();
        mac.update(&payload);
        mac.verify_slice(&signature)
            .map_err(|_| IntentError::BadSignature)?;

        let claims: Claims =
            serde_json::from_slice(&payload).map_err(|_| IntentError::Malformed)?;
        if now >= claims.exp {
            return Err(IntentError::Expired(claims.exp));
        }

        Ok(claims.intent)
    }
}
