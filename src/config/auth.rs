//! Authentication configuration

use serde::Deserialize;

use super::error::ValidationError;
use super::server::Environment;

const MIN_PRODUCTION_SECRET_LEN: usize = 32;

/// Session token settings (HS256 JWTs from the storefront's identity service)
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Shared HMAC signing secret
    pub jwt_secret: String,

    /// Expected `iss` claim
    pub jwt_issuer: String,

    /// Expected `aud` claim
    #[serde(default = "default_audience")]
    pub jwt_audience: String,

    /// Allowed clock skew when checking `exp`, in seconds
    #[serde(default = "default_leeway")]
    pub leeway_secs: u64,
}

impl AuthConfig {
    /// Validate authentication configuration
    ///
    /// Production additionally requires a secret of at least 32 bytes.
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if self.jwt_secret.is_empty() {
            return Err(ValidationError::MissingRequired("AUTH__JWT_SECRET"));
        }
        if self.jwt_issuer.is_empty() {
            return Err(ValidationError::MissingRequired("AUTH__JWT_ISSUER"));
        }
        if self.jwt_audience.is_empty() {
            return Err(ValidationError::MissingRequired("AUTH__JWT_AUDIENCE"));
        }
        if *environment == Environment::Production
            && self.jwt_secret.len() < MIN_PRODUCTION_SECRET_LEN
        {
            return Err(ValidationError::WeakJwtSecret);
        }
        Ok(())
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            jwt_issuer: String::new(),
            jwt_audience: default_audience(),
            leeway_secs: default_leeway(),
        }
    }
}

fn default_audience() -> String {
    "course-checkout".to_string()
}

fn default_leeway() -> u64 {
    30
}
