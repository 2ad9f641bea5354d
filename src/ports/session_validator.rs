//! Session validation port.
//!
//! Turns a bearer token issued by the storefront's identity service into
//! an [`AuthenticatedUser`]. Implementations must check signature, issuer,
//! audience and expiry.

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser};

/// Validates access tokens and extracts user identity.
///
/// # Contract
///
/// - `AuthError::InvalidToken` for malformed tokens or bad signatures
/// - `AuthError::TokenExpired` for expired tokens
/// - `AuthError::ServiceUnavailable` for transient errors
#[async_trait]
pub trait SessionValidator: Send + Sync {
    /// Validates a raw token (without the `Bearer ` prefix).
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError>;
}
