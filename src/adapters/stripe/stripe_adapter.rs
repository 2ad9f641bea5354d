//! Stripe payment provider adapter.
//!
//! Talks to the REST API directly with form-encoded requests and basic auth,
//! the same way Stripe's own curl examples do.
//!
//! # Configuration
//!
//! ```ignore
//! let config = StripeConfig::new(api_key).with_currency("usd");
//! let adapter = StripePaymentAdapter::new(config);
//! ```

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};

use super::api_types::{StripeCreatedSession, StripeErrorEnvelope};
use crate::domain::checkout::CompletedCheckout;
use crate::domain::webhook::StripeCheckoutSessionObject;
use crate::ports::{
    CheckoutSession, CreateCheckoutRequest, PaymentError, PaymentErrorCode, PaymentProvider,
};

const DEFAULT_API_BASE_URL: &str = "https://api.stripe.com";

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeConfig {
    /// Secret API key (`sk_live_...` or `sk_test_...`).
    api_key: SecretString,

    /// Base URL for the API; overridden in tests.
    api_base_url: String,

    /// ISO currency code for every line item.
    currency: String,
}

impl StripeConfig {
    pub fn new(api_key: SecretString) -> Self {
        Self {
            api_key,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            currency: "usd".to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into().to_lowercase();
        self
    }
}

/// Stripe payment provider adapter.
pub struct StripePaymentAdapter {
    config: StripeConfig,
    http_client: reqwest::Client,
}

impl StripePaymentAdapter {
    pub fn new(config: StripeConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    async fn error_from_response(response: reqwest::Response) -> PaymentError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        map_error_response(status, &body)
    }
}

#[async_trait]
impl PaymentProvider for StripePaymentAdapter {
    async fn create_checkout_session(
        &self,
        request: CreateCheckoutRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        let url = format!("{}/v1/checkout/sessions", self.config.api_base_url);
        let params = checkout_form_params(&request, &self.config.currency)?;

        let mut builder = self
            .http_client
            .post(&url)
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .form(&params);
        if let Some(key) = &request.idempotency_key {
            builder = builder.header("Idempotency-Key", key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| PaymentError::network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let session: StripeCreatedSession = response.json().await.map_err(|e| {
            PaymentError::provider(format!("Failed to parse Stripe response: {}", e))
        })?;

        let url = session
            .url
            .ok_or_else(|| PaymentError::provider("Stripe session has no payment URL"))?;

        tracing::debug!(session_id = %session.id, "Created Stripe checkout session");

        Ok(CheckoutSession {
            id: session.id,
            url,
        })
    }

    async fn retrieve_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<CompletedCheckout, PaymentError> {
        let url = format!(
            "{}/v1/checkout/sessions/{}",
            self.config.api_base_url, session_id
        );

        let response = self
            .http_client
            .get(&url)
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .send()
            .await
            .map_err(|e| PaymentError::network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let session: StripeCheckoutSessionObject = response.json().await.map_err(|e| {
            PaymentError::provider(format!("Failed to parse Stripe session: {}", e))
        })?;

        Ok(session.into())
    }
}

/// Builds the form body for `POST /v1/checkout/sessions`.
fn checkout_form_params(
    request: &CreateCheckoutRequest,
    currency: &str,
) -> Result<Vec<(String, String)>, PaymentError> {
    let mut params = vec![
        ("mode".to_string(), "payment".to_string()),
        ("payment_method_types[0]".to_string(), "card".to_string()),
        ("success_url".to_string(), request.success_url.clone()),
        ("cancel_url".to_string(), request.cancel_url.clone()),
    ];

    for (i, item) in request.line_items.iter().enumerate() {
        let unit_amount = item
            .unit_amount
            .to_minor_units()
            .ok_or_else(|| PaymentError::invalid_request("Line item amount out of range"))?;
        let prefix = format!("line_items[{}]", i);

        params.push((format!("{}[price_data][currency]", prefix), currency.to_string()));
        params.push((
            format!("{}[price_data][product_data][name]", prefix),
            item.name.clone(),
        ));
        if let Some(description) = &item.description {
            params.push((
                format!("{}[price_data][product_data][description]", prefix),
                description.clone(),
            ));
        }
        params.push((
            format!("{}[price_data][unit_amount]", prefix),
            unit_amount.to_string(),
        ));
        params.push((format!("{}[quantity]", prefix), item.quantity.to_string()));
    }

    if let Some(email) = &request.customer_email {
        params.push(("customer_email".to_string(), email.clone()));
    }
    if let Some(reference) = &request.client_reference_id {
        params.push(("client_reference_id".to_string(), reference.clone()));
    }

    let mut metadata: Vec<_> = request.metadata.iter().collect();
    metadata.sort();
    for (key, value) in metadata {
        params.push((format!("metadata[{}]", key), value.clone()));
    }

    Ok(params)
}

/// Maps a failed Stripe response to a `PaymentError`.
fn map_error_response(status: StatusCode, body: &str) -> PaymentError {
    let parsed = serde_json::from_str::<StripeErrorEnvelope>(body).ok();
    let message = parsed
        .as_ref()
        .and_then(|e| e.error.message.clone())
        .unwrap_or_else(|| format!("Stripe API error ({})", status));

    let code = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => PaymentErrorCode::AuthenticationError,
        StatusCode::NOT_FOUND => PaymentErrorCode::NotFound,
        StatusCode::TOO_MANY_REQUESTS => PaymentErrorCode::RateLimitExceeded,
        s if s.is_client_error() => PaymentErrorCode::InvalidRequest,
        s if s.is_server_error() => PaymentErrorCode::ProviderError,
        _ => PaymentErrorCode::Unknown,
    };

    let error = PaymentError::new(code, message);
    match parsed.and_then(|e| e.error.code.or(e.error.error_type)) {
        Some(provider_code) => error.with_provider_code(provider_code),
        None => error,
    }
}
