//! Webhook error types.
//!
//! Status codes steer the provider's redelivery: anything non-2xx is
//! retried with backoff, so only transient failures should produce 5xx.

use axum::http::StatusCode;
use thiserror::Error;

use crate::domain::foundation::DomainError;

/// Errors that occur during webhook processing.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// No `Stripe-Signature` header on the request.
    #[error("Missing signature")]
    MissingSignature,

    /// Webhook signature verification failed.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Webhook timestamp is older than the tolerance window.
    #[error("Timestamp out of range")]
    TimestampOutOfRange,

    /// Event timestamp is in the future beyond clock skew tolerance.
    #[error("Invalid timestamp")]
    InvalidTimestamp,

    /// Failed to parse webhook payload or signature header.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Event was intentionally ignored (not an error condition).
    #[error("Event ignored: {0}")]
    Ignored(String),

    /// A record the event refers to does not exist (yet).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(String),

    /// A downstream service failed.
    #[error("External service error: {0}")]
    External(String),
}

impl WebhookError {
    /// Returns true if the provider should redeliver this webhook.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WebhookError::Database(_) | WebhookError::External(_) | WebhookError::NotFound(_)
        )
    }

    /// Maps the error to an HTTP status code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::MissingSignature
            | WebhookError::InvalidSignature
            | WebhookError::TimestampOutOfRange
            | WebhookError::InvalidTimestamp
            | WebhookError::ParseError(_) => StatusCode::BAD_REQUEST,

            WebhookError::Ignored(_) => StatusCode::OK,

            WebhookError::NotFound(_) | WebhookError::Database(_) | WebhookError::External(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// True for failures of the signature check itself.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            WebhookError::MissingSignature
                | WebhookError::InvalidSignature
                | WebhookError::TimestampOutOfRange
                | WebhookError::InvalidTimestamp
        )
    }
}

impl From<DomainError> for WebhookError {
    fn from(err: DomainError) -> Self {
        if err.code.is_not_found() {
            WebhookError::NotFound(err.to_string())
        } else {
            WebhookError::Database(err.to_string())
        }
    }
}
