//! `Paddle-Signature` verification.
//!
//! Paddle signs every notification with HMAC-SHA256 over `"{ts}:{raw body}"`
//! and sends `ts=<unix seconds>;h1=<hex digest>`. During secret rotation the
//! header may carry several `h1` entries; any one matching is enough.
//!
//! The body must be the exact bytes received. Parsing it first and
//! re-serializing changes the digest.

use std::time::Duration;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the signature.
pub const SIGNATURE_HEADER: &str = "paddle-signature";

/// Why a signature was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    /// Header has no `ts` or no `h1` component.
    #[error("Malformed signature header")]
    Malformed,

    /// `ts` is not a unix timestamp.
    #[error("Invalid signature timestamp")]
    InvalidTimestamp,

    /// `ts` is older than the allowed variance.
    #[error("Signature timestamp outside allowed variance")]
    Expired,

    /// No `h1` matched the computed digest.
    #[error("Signature mismatch")]
    Mismatch,
}

struct ParsedHeader<'a> {
    timestamp: &'a str,
    signatures: Vec<&'a str>,
}

fn parse_header(header: &str) -> Result<ParsedHeader<'_>, SignatureError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(';') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key.trim() {
            "ts" => timestamp = Some(value.trim()),
            "h1" => signatures.push(value.trim()),
            _ => {}
        }
    }

    match timestamp {
        Some(timestamp) if !timestamp.is_empty() && !signatures.is_empty() => Ok(ParsedHeader {
            timestamp,
            signatures,
        }),
        _ => Err(SignatureError::Malformed),
    }
}

fn mac_for(secret: &str, timestamp: &str, body: &[u8]) -> HmacSha256 {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes())
        .unwrap_or_else(|_| unreachable!("HMAC-SHA256 accepts any key length"));
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(body);
    mac
}

/// Verifies inbound webhook signatures against the shared secret.
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: SecretString,
    max_variance: Option<Duration>,
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("secret", &"[REDACTED]")
            .field("max_variance", &self.max_variance)
            .finish()
    }
}

impl WebhookVerifier {
    /// `max_variance` of `None` accepts any timestamp age.
    #[must_use]
    pub const fn new(secret: SecretString, max_variance: Option<Duration>) -> Self {
        Self {
            secret,
            max_variance,
        }
    }

    /// Verify `header` against `body` at the current time.
    ///
    /// # Errors
    ///
    /// Returns `SignatureError` when the header is malformed, too old, or no
    /// digest matches.
    pub fn verify(&self, header: &str, body: &[u8]) -> Result<(), SignatureError> {
        self.verify_at(header, body, Utc::now())
    }

    /// Verify as of `now`.
    ///
    /// # Errors
    ///
    /// Same as [`WebhookVerifier::verify`].
    pub fn verify_at(
        &self,
        header: &str,
        body: &[u8],
        now: DateTime<Utc>,
    ) -> Result<(), SignatureError> {
        let parsed = parse_header(header)?;

        let ts: i64 = parsed
            .timestamp
            .parse()
            .map_err(|_| SignatureError::InvalidTimestamp)?;

        if let Some(max) = self.max_variance {
            let max = i64::try_from(max.as_secs()).unwrap_or(i64::MAX);
            if now.timestamp().saturating_sub(ts) > max {
                return Err(SignatureError::Expired);
            }
        }

        let mac = mac_for(self.secret.expose_secret(), parsed.timestamp, body);

        let matched = parsed.signatures.iter().any(|candidate| {
            hex::decode(candidate).is_ok_and(|bytes| mac.clone().verify_slice(&bytes).is_ok())
        });

        if matched {
            Ok(())
        } else {
            Err(SignatureError::Mismatch)
        }
    }
}

/// Build a valid `Paddle-Signature` header value.
///
/// Used by tests and local tooling that need to post signed notifications.
#[must_use]
pub fn signature_header(secret: &str, timestamp: i64, body: &[u8]) -> String {
    let ts = timestamp.to_string();
    let digest = mac_for(secret, &ts, body).finalize().into_bytes();
    format!("ts={ts};h1={}", hex::encode(digest))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SECRET: &str = "pdl_ntfset_01h8test_secret";
    const BODY: &[u8] = br#"{"event_id":"evt_01","event_type":"transaction.paid","data":{"id":"txn_01"}}"#;

    fn verifier(max_variance: Option<u64>) -> WebhookVerifier {
        WebhookVerifier::new(
            SecretString::from(SECRET),
            max_variance.map(Duration::from_secs),
        )
    }

    fn at(ts: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(ts, 0).unwrap()
    }

    #[test]
    fn test_valid_signature() {
        let header = signature_header(SECRET, 1_700_000_000, BODY);
        assert!(verifier(Some(5)).verify_at(&header, BODY, at(1_700_000_002)).is_ok());
    }

    #[test]
    fn test_tampered_body() {
        let header = signature_header(SECRET, 1_700_000_000, BODY);
        let tampered = br#"{"event_id":"evt_01","event_type":"transaction.paid","data":{"id":"txn_02"}}"#;
        assert_eq!(
            verifier(None).verify_at(&header, tampered, at(1_700_000_000)),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_wrong_secret() {
        let header = signature_header("some_other_secret", 1_700_000_000, BODY);
        assert_eq!(
            verifier(None).verify_at(&header, BODY, at(1_700_000_000)),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_any_h1_may_match() {
        let good = signature_header(SECRET, 1_700_000_000, BODY);
        let digest = good.split_once(";h1=").unwrap().1;
        let header = format!("ts=1700000000;h1={};h1={digest}", "ab".repeat(32));
        assert!(verifier(None).verify_at(&header, BODY, at(1_700_000_000)).is_ok());
    }

    #[test]
    fn test_stale_timestamp() {
        let header = signature_header(SECRET, 1_700_000_000, BODY);
        assert_eq!(
            verifier(Some(5)).verify_at(&header, BODY, at(1_700_000_006)),
            Err(SignatureError::Expired)
        );
        // Disabled variance accepts old deliveries.
        assert!(verifier(None).verify_at(&header, BODY, at(1_800_000_000)).is_ok());
    }

    #[test]
    fn test_malformed_headers() {
        let v = verifier(None);
        let now = at(1_700_000_000);
        assert_eq!(v.verify_at("", BODY, now), Err(SignatureError::Malformed));
        assert_eq!(v.verify_at("ts=1700000000", BODY, now), Err(SignatureError::Malformed));
        assert_eq!(v.verify_at("h1=abcd", BODY, now), Err(SignatureError::Malformed));
        assert_eq!(
            v.verify_at("ts=yesterday;h1=abcd", BODY, now),
            Err(SignatureError::InvalidTimestamp)
        );
        assert_eq!(
            v.verify_at("ts=1700000000;h1=not-hex", BODY, now),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_header_whitespace_tolerated() {
        let header = signature_header(SECRET, 1_700_000_000, BODY).replace(';', " ; ");
        assert!(verifier(None).verify_at(&header, BODY, at(1_700_000_000)).is_ok());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let debug = format!("{:?}", verifier(Some(5)));
        assert!(!debug.contains(SECRET));
    }
}
