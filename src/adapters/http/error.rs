//! JSON error bodies and the mapping from application errors to HTTP.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::domain::checkout::CheckoutError;
use crate::domain::foundation::DomainError;
use crate::domain::webhook::WebhookError;

/// Standard error body: `{ "code": ..., "message": ... }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn json(code: impl Into<String>, message: impl Into<String>) -> Json<Self> {
        Json(Self::new(code, message))
    }
}

/// API error type that converts application errors to HTTP responses.
#[derive(Debug)]
pub struct ApiError(pub CheckoutError);

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        Self(err)
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(CheckoutError::from(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        let message = if self.0.is_client_error() {
            self.0.to_string()
        } else {
            tracing::error!(error = %self.0, code = self.0.code(), "Request failed");
            "An internal error occurred".to_string()
        };
        (status, ErrorResponse::json(self.0.code(), message)).into_response()
    }
}

/// Webhook failures. Details stay in the logs.
#[derive(Debug)]
pub struct WebhookApiError(pub WebhookError);

impl From<WebhookError> for WebhookApiError {
    fn from(err: WebhookError) -> Self {
        Self(err)
    }
}

impl IntoResponse for WebhookApiError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        if status == StatusCode::OK {
            tracing::info!(reason = %self.0, "Webhook event ignored");
            return (status, Json(serde_json::json!({ "received": true }))).into_response();
        }

        let (code, message) = if status.is_client_error() {
            tracing::warn!(error = %self.0, "Webhook rejected");
            ("WEBHOOK_REJECTED", self.0.to_string())
        } else {
            tracing::error!(error = %self.0, retryable = self.0.is_retryable(), "Webhook processing failed");
            ("WEBHOOK_FAILED", "Webhook processing failed".to_string())
        };
        (status, ErrorResponse::json(code, message)).into_response()
    }
}
