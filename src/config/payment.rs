//! Payment configuration

use std::time::Duration;

use serde::Deserialize;

use super::error::ValidationError;

/// Payment configuration (Stripe)
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Stripe secret API key
    pub stripe_api_key: String,

    /// Stripe webhook signing secret
    pub stripe_webhook_secret: String,

    /// ISO currency for every line item
    #[serde(default = "default_currency")]
    pub currency: String,

    /// API base URL override (stripe-mock, proxies)
    pub api_base_url: Option<String>,

    /// Days handled webhook events are kept for deduplication
    #[serde(default = "default_webhook_retention_days")]
    pub webhook_retention_days: u32,

    /// Seconds between webhook retention sweeps
    #[serde(default = "default_webhook_sweep_secs")]
    pub webhook_sweep_secs: u64,
}

impl PaymentConfig {
    /// Check if using Stripe test mode
    pub fn is_test_mode(&self) -> bool {
        self.stripe_api_key.starts_with("sk_test_")
    }

    /// Check if using Stripe live mode
    pub fn is_live_mode(&self) -> bool {
        self.stripe_api_key.starts_with("sk_live_")
    }

    pub fn webhook_retention(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.webhook_retention_days))
    }

    pub fn webhook_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.webhook_sweep_secs)
    }

    /// Validate payment configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.stripe_api_key.is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT__STRIPE_API_KEY"));
        }
        if self.stripe_webhook_secret.is_empty() {
            return Err(ValidationError::MissingRequired(
                "PAYMENT__STRIPE_WEBHOOK_SECRET",
            ));
        }
        if !self.stripe_api_key.starts_with("sk_") {
            return Err(ValidationError::InvalidStripeKey);
        }
        if !self.stripe_webhook_secret.starts_with("whsec_") {
            return Err(ValidationError::InvalidStripeWebhookSecret);
        }
        if let Some(url) = &self.api_base_url {
            if !url.starts_with("https://") && !url.starts_with("http://") {
                return Err(ValidationError::InvalidStripeBaseUrl);
            }
        }
        // Stripe redelivers for up to three days.
        if self.webhook_retention_days < 3 || self.webhook_sweep_secs == 0 {
            return Err(ValidationError::InvalidWebhookRetention);
        }
        Ok(())
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            stripe_api_key: String::new(),
            stripe_webhook_secret: String::new(),
            currency: default_currency(),
            api_base_url: None,
            webhook_retention_days: default_webhook_retention_days(),
            webhook_sweep_secs: default_webhook_sweep_secs(),
        }
    }
}

fn default_currency() -> String {
    "usd".to_string()
}

fn default_webhook_retention_days() -> u32 {
    30
}

fn default_webhook_sweep_secs() -> u64 {
    3600
}
