//! Stripe webhook signature verification.
//!
//! HMAC-SHA256 over `"{t}.{raw body}"` with the endpoint secret, compared in
//! constant time against every `v1` entry of the `Stripe-Signature` header.
//! The timestamp window bounds replay.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::errors::WebhookError;
use super::stripe_event::StripeEvent;
use crate::domain::foundation::Timestamp;

/// Maximum allowed age for webhook events (5 minutes).
const MAX_EVENT_AGE_SECS: i64 = 300;

/// Maximum allowed clock skew for future events (1 minute).
const MAX_CLOCK_SKEW_SECS: i64 = 60;

type HmacSha256 = Hmac<Sha256>;

/// Parsed components of the `Stripe-Signature` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    /// Unix timestamp when the signature was generated.
    pub timestamp: i64,
    /// Every v1 signature present. Stripe sends several while a secret rolls.
    pub v1_signatures: Vec<Vec<u8>>,
}

impl SignatureHeader {
    /// Parses a `Stripe-Signature` header.
    ///
    /// Format: `t=<timestamp>,v1=<signature>[,v1=<signature>...][,v0=<legacy>]`
    ///
    /// Unknown schemes (including `v0`) are skipped.
    pub fn parse(header: &str) -> Result<Self, WebhookError> {
        let mut timestamp: Option<i64> = None;
        let mut v1_signatures = Vec::new();

        for part in header.split(',') {
            let (key, value) = part
                .trim()
                .split_once('=')
                .ok_or_else(|| WebhookError::ParseError("invalid header format".to_string()))?;

            match key {
                "t" => {
                    timestamp = Some(value.parse().map_err(|_| {
                        WebhookError::ParseError("invalid timestamp".to_string())
                    })?);
                }
                "v1" => {
                    // A malformed entry simply cannot match.
                    if let Ok(bytes) = hex::decode(value) {
                        v1_signatures.push(bytes);
                    }
                }
                _ => {}
            }
        }

        let timestamp =
            timestamp.ok_or_else(|| WebhookError::ParseError("missing timestamp".to_string()))?;
        if v1_signatures.is_empty() {
            return Err(WebhookError::InvalidSignature);
        }

        Ok(SignatureHeader {
            timestamp,
            v1_signatures,
        })
    }
}

/// Verifier for Stripe webhook signatures.
#[derive(Clone)]
pub struct StripeWebhookVerifier {
    secret: SecretString,
}

impl StripeWebhookVerifier {
    /// Creates a verifier for the endpoint's signing secret (`whsec_...`).
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    /// Verifies the signature against the current clock and parses the event.
    pub fn verify_and_parse(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<StripeEvent, WebhookError> {
        self.verify_at(payload, signature_header, Timestamp::now())
    }

    /// Verifies the signature as of `now` and parses the event.
    ///
    /// # Errors
    ///
    /// - `InvalidSignature` - no v1 signature matches
    /// - `TimestampOutOfRange` - signed more than 5 minutes before `now`
    /// - `InvalidTimestamp` - signed more than 1 minute after `now`
    /// - `ParseError` - malformed header or JSON body
    pub fn verify_at(
        &self,
        payload: &[u8],
        signature_header: &str,
        now: Timestamp,
    ) -> Result<StripeEvent, WebhookError> {
        if signature_header.trim().is_empty() {
            return Err(WebhookError::MissingSignature);
        }

        let header = SignatureHeader::parse(signature_header)?;
        validate_timestamp(header.timestamp, now.as_unix_secs())?;

        let expected = compute_signature(self.secret.expose_secret(), header.timestamp, payload)?;
        let matched = header
            .v1_signatures
            .iter()
            .any(|candidate| constant_time_compare(&expected, candidate));
        if !matched {
            return Err(WebhookError::InvalidSignature);
        }

        serde_json::from_slice(payload).map_err(|e| WebhookError::ParseError(e.to_string()))
    }
}

impl std::fmt::Debug for StripeWebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeWebhookVerifier")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

fn validate_timestamp(timestamp: i64, now: i64) -> Result<(), WebhookError> {
    let age = now - timestamp;

    if age > MAX_EVENT_AGE_SECS {
        return Err(WebhookError::TimestampOutOfRange);
    }
    if age < -MAX_CLOCK_SKEW_SECS {
        return Err(WebhookError::InvalidTimestamp);
    }

    Ok(())
}

fn compute_signature(secret: &str, timestamp: i64, payload: &[u8]) -> Result<Vec<u8>, WebhookError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| WebhookError::InvalidSignature)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Builds a `Stripe-Signature` header value for `payload`.
///
/// Used by fixtures and local tooling that replay events against the endpoint.
pub fn signature_header(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    let signature = compute_signature(secret, timestamp, payload)
        .map(hex::encode)
        .unwrap_or_default();
    format!("t={},v1={}", timestamp, signature)
}
