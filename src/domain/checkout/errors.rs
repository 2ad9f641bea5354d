//! Checkout error types.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | Unauthorized | 403 |
//! | Validation | 400 |
//! | EmptyCart | 400 |
//! | NotFound | 404 |
//! | MalformedSession | 400 |
//! | NotPaid | 402 |
//! | CheckoutCreation | 500 |
//! | External | 502 |
//! | Internal | 500 |

use axum::http::StatusCode;
use thiserror::Error;

use super::MetadataError;
use crate::domain::foundation::{DomainError, ErrorCode, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    /// The caller does not own the checkout session.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Cart is empty")]
    EmptyCart,

    #[error("{0} not found")]
    NotFound(String),

    /// The provider refused or failed to create a session.
    #[error("Failed to create checkout session: {0}")]
    CheckoutCreation(String),

    /// Session metadata lacks what reconciliation needs.
    #[error("Malformed checkout session: {0}")]
    MalformedSession(String),

    #[error("Checkout session is not paid")]
    NotPaid,

    #[error("External service error: {0}")]
    External(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CheckoutError {
    pub fn not_found(resource: impl Into<String>) -> Self {
        CheckoutError::NotFound(resource.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        CheckoutError::Internal(message.into())
    }

    /// Stable machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            CheckoutError::Unauthorized(_) => "FORBIDDEN",
            CheckoutError::Validation(_) => "VALIDATION_FAILED",
            CheckoutError::EmptyCart => "EMPTY_CART",
            CheckoutError::NotFound(_) => "NOT_FOUND",
            CheckoutError::CheckoutCreation(_) => "CHECKOUT_CREATION_FAILED",
            CheckoutError::MalformedSession(_) => "MALFORMED_SESSION",
            CheckoutError::NotPaid => "NOT_PAID",
            CheckoutError::External(_) => "EXTERNAL_SERVICE_ERROR",
            CheckoutError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            CheckoutError::Unauthorized(_) => StatusCode::FORBIDDEN,
            CheckoutError::Validation(_)
            | CheckoutError::EmptyCart
            | CheckoutError::MalformedSession(_) => StatusCode::BAD_REQUEST,
            CheckoutError::NotFound(_) => StatusCode::NOT_FOUND,
            CheckoutError::NotPaid => StatusCode::PAYMENT_REQUIRED,
            CheckoutError::External(_) => StatusCode::BAD_GATEWAY,
            CheckoutError::CheckoutCreation(_) | CheckoutError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// True for failures that may succeed if the same call is repeated.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CheckoutError::External(_) | CheckoutError::Internal(_))
    }

    /// True when the message is safe to show to the client verbatim.
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

impl From<DomainError> for CheckoutError {
    fn from(err: DomainError) -> Self {
        match err.code {
            code if code.is_not_found() => CheckoutError::NotFound(err.message),
            ErrorCode::ValidationFailed | ErrorCode::EmptyField | ErrorCode::InvalidFormat => {
                CheckoutError::Validation(err.message)
            }
            ErrorCode::Unauthorized | ErrorCode::Forbidden => CheckoutError::Unauthorized(err.message),
            ErrorCode::PaymentProviderError | ErrorCode::NotificationError => {
                CheckoutError::External(err.message)
            }
            _ => CheckoutError::Internal(err.to_string()),
        }
    }
}

impl From<ValidationError> for CheckoutError {
    fn from(err: ValidationError) -> Self {
        CheckoutError::Validation(err.to_string())
    }
}

impl From<MetadataError> for CheckoutError {
    fn from(err: MetadataError) -> Self {
        CheckoutError::MalformedSession(err.to_string())
    }
}
