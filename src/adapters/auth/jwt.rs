//! HS256 JWT adapter for session validation.
//!
//! The storefront's identity service signs session tokens with a shared
//! secret. This adapter implements the `SessionValidator` port by:
//!
//! 1. Checking the HS256 signature against the shared secret
//! 2. Validating issuer, audience and expiry claims
//! 3. Mapping claims to the domain `AuthenticatedUser` type

use async_trait::async_trait;
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AuthError, AuthenticatedUser, UserId};
use crate::ports::SessionValidator;

/// Configuration for the JWT adapter.
#[derive(Clone)]
pub struct JwtConfig {
    pub secret: SecretString,
    /// Expected `iss` claim.
    pub issuer: String,
    /// Expected `aud` claim.
    pub audience: String,
    /// Clock skew allowance for `exp`, in seconds.
    pub leeway_secs: u64,
}

impl JwtConfig {
    pub fn new(secret: SecretString, issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            secret,
            issuer: issuer.into(),
            audience: audience.into(),
            leeway_secs: 30,
        }
    }
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"[REDACTED]")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("leeway_secs", &self.leeway_secs)
            .finish()
    }
}

/// Session token claims.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub iss: String,
    pub aud: String,
    pub exp: i64,
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Production `SessionValidator` backed by a shared HS256 secret.
pub struct JwtSessionValidator {
    key: DecodingKey,
    validation: Validation,
}

impl JwtSessionValidator {
    pub fn new(config: &JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&config.issuer]);
        validation.set_audience(&[&config.audience]);
        validation.validate_exp = true;
        validation.leeway = config.leeway_secs;
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);

        Self {
            key: DecodingKey::from_secret(config.secret.expose_secret().as_bytes()),
            validation,
        }
    }
}

#[async_trait]
impl SessionValidator for JwtSessionValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let data = decode::<SessionClaims>(token, &self.key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => {
                    tracing::debug!("Token expired");
                    AuthError::TokenExpired
                }
                ErrorKind::InvalidIssuer | ErrorKind::InvalidAudience => {
                    tracing::warn!(error = %e, "Token issued for another service");
                    AuthError::InvalidToken
                }
                _ => {
                    tracing::debug!(error = %e, "Token rejected");
                    AuthError::InvalidToken
                }
            }
        })?;

        let claims = data.claims;
        let id = UserId::new(claims.sub).map_err(|_| AuthError::InvalidToken)?;
        Ok(AuthenticatedUser::new(id, claims.email, claims.name))
    }
}
