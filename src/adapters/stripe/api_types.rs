//! Stripe REST API wire types not shared with webhook payloads.

use serde::Deserialize;

/// Body of a non-2xx Stripe response.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorEnvelope {
    pub error: StripeApiError,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeApiError {
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response of `POST /v1/checkout/sessions`.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeCreatedSession {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
}
