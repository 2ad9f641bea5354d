//! Payment provider port for hosted checkout.
//!
//! The provider hosts the payment page; we create sessions and, on the
//! success-page fallback path, read them back. Signature verification of
//! webhooks lives in `domain::webhook` since it needs no network access.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::checkout::{CheckoutLineItem, CompletedCheckout};
use crate::domain::foundation::{DomainError, ErrorCode};

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Creates a hosted checkout session; returns its id and payment URL.
    async fn create_checkout_session(
        &self,
        request: CreateCheckoutRequest,
    ) -> Result<CheckoutSession, PaymentError>;

    /// Fetches a session's current state.
    async fn retrieve_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<CompletedCheckout, PaymentError>;
}

/// Request to create a hosted checkout session.
#[derive(Debug, Clone)]
pub struct CreateCheckoutRequest {
    pub line_items: Vec<CheckoutLineItem>,

    /// Already-encoded metadata envelope.
    pub metadata: HashMap<String, String>,

    /// Must contain the `{CHECKOUT_SESSION_ID}` placeholder.
    pub success_url: String,

    pub cancel_url: String,

    /// Prefills the payment page.
    pub customer_email: Option<String>,

    pub client_reference_id: Option<String>,

    /// Idempotency key for safe retries.
    pub idempotency_key: Option<String>,
}

/// A created checkout session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

/// Errors from payment provider operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentError {
    pub code: PaymentErrorCode,

    pub message: String,

    /// Provider's error code (if available).
    pub provider_code: Option<String>,

    pub retryable: bool,
}

impl PaymentError {
    pub fn new(code: PaymentErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider_code: None,
            retryable: code.is_retryable(),
        }
    }

    pub fn with_provider_code(mut self, code: impl Into<String>) -> Self {
        self.provider_code = Some(code.into());
        self
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::NetworkError, message)
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::AuthenticationError, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::InvalidRequest, message)
    }

    pub fn not_found(resource: &str) -> Self {
        Self::new(PaymentErrorCode::NotFound, format!("{} not found", resource))
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::ProviderError, message)
    }
}

impl std::fmt::Display for PaymentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for PaymentError {}

impl From<PaymentError> for DomainError {
    fn from(err: PaymentError) -> Self {
        let code = match err.code {
            PaymentErrorCode::NotFound => ErrorCode::CheckoutSessionNotFound,
            _ => ErrorCode::PaymentProviderError,
        };
        DomainError::new(code, err.message)
    }
}

/// Payment error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentErrorCode {
    NetworkError,
    AuthenticationError,
    /// Provider rejected the parameters.
    InvalidRequest,
    NotFound,
    RateLimitExceeded,
    /// Provider-side 5xx or unexpected response.
    ProviderError,
    Unknown,
}

impl PaymentErrorCode {
    /// Check if this error type is typically retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PaymentErrorCode::NetworkError
                | PaymentErrorCode::RateLimitExceeded
                | PaymentErrorCode::ProviderError
        )
    }
}

impl std::fmt::Display for PaymentErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentErrorCode::NetworkError => "network_error",
            PaymentErrorCode::AuthenticationError => "authentication_error",
            PaymentErrorCode::InvalidRequest => "invalid_request",
            PaymentErrorCode::NotFound => "not_found",
            PaymentErrorCode::RateLimitExceeded => "rate_limit_exceeded",
            PaymentErrorCode::ProviderError => "provider_error",
            PaymentErrorCode::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}
