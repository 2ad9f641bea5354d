//! Rate limiting port.
//!
//! Fixed-window counters keyed by scope. The in-memory adapter only sees
//! one process; deployments with more than one instance use the Redis
//! adapter so every instance shares the same counters.

use async_trait::async_trait;
use std::fmt;

use crate::domain::foundation::{Timestamp, UserId};

/// Prefix for every counter key, shared by all adapters.
const KEY_PREFIX: &str = "checkout:ratelimit";

/// Port for request quotas.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Counts one request against the key's window.
    async fn check(&self, key: RateLimitKey) -> Result<RateLimitResult, RateLimitError>;

    /// Current window state without counting a request.
    async fn status(&self, key: RateLimitKey) -> Result<RateLimitStatus, RateLimitError>;

    /// Clears the current window for a key.
    async fn reset(&self, key: RateLimitKey) -> Result<(), RateLimitError>;
}

/// Which counter a request is charged to.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct RateLimitKey {
    pub scope: RateLimitScope,
    /// Client IP or user id; `"global"` for the global scope.
    pub identifier: String,
    /// Named quota inside the user scope, such as checkout creation.
    pub resource: Option<String>,
}

#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub enum RateLimitScope {
    Global,
    Ip,
    User,
}

impl RateLimitKey {
    pub fn global() -> Self {
        Self {
            scope: RateLimitScope::Global,
            identifier: "global".to_string(),
            resource: None,
        }
    }

    pub fn ip(ip: &str) -> Self {
        Self {
            scope: RateLimitScope::Ip,
            identifier: ip.to_string(),
            resource: None,
        }
    }

    pub fn user(user_id: &UserId) -> Self {
        Self {
            scope: RateLimitScope::User,
            identifier: user_id.to_string(),
            resource: None,
        }
    }

    /// A user's quota for one resource, counted apart from the general limit.
    pub fn user_resource(user_id: &UserId, resource: &str) -> Self {
        Self {
            resource: Some(resource.to_string()),
            ..Self::user(user_id)
        }
    }

    /// Storage key for the counter, e.g. `checkout:ratelimit:user:u-1:checkout`.
    pub fn counter_key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for RateLimitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", KEY_PREFIX, self.scope, self.identifier)?;
        if let Some(resource) = &self.resource {
            write!(f, ":{}", resource)?;
        }
        Ok(())
    }
}

impl RateLimitScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            RateLimitScope::Global => "global",
            RateLimitScope::Ip => "ip",
            RateLimitScope::User => "user",
        }
    }
}

impl fmt::Display for RateLimitScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of counting a request.
#[derive(Debug, Clone)]
pub enum RateLimitResult {
    Allowed(RateLimitStatus),
    Denied(RateLimitDenied),
}

impl RateLimitResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitResult::Allowed(_))
    }

    pub fn is_denied(&self) -> bool {
        !self.is_allowed()
    }
}

/// Window state, reported back to clients as `X-RateLimit-*` headers.
#[derive(Debug, Clone)]
pub struct RateLimitStatus {
    pub limit: u32,
    pub remaining: u32,
    pub reset_at: Timestamp,
    pub window_secs: u32,
}

/// Why a request was refused.
#[derive(Debug, Clone)]
pub struct RateLimitDenied {
    pub limit: u32,
    /// Seconds until the window rolls over; never zero.
    pub retry_after_secs: u32,
    pub scope: RateLimitScope,
    pub message: String,
}

/// Backend failures. Callers let the request through on any of these.
#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("rate limiter unavailable: {0}")]
    Unavailable(String),
}
