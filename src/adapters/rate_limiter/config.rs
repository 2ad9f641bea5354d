//! Rate limit configuration types.
//!
//! Limits for the global, per-IP and per-user scopes. Deserialized from
//! the `rate_limit` section of the application config.

use serde::{Deserialize, Serialize};

use crate::ports::{RateLimitKey, RateLimitScope};

/// Resource name for the checkout-creating endpoints.
pub const CHECKOUT_RESOURCE: &str = "checkout";

/// Every window is one minute.
pub const WINDOW_SECS: u32 = 60;

/// Complete rate limit configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Master switch; when false the middleware skips all checks.
    pub enabled: bool,
    /// Global rate limits (infrastructure protection).
    pub global: GlobalLimits,
    /// Per-IP rate limits (abuse protection).
    pub per_ip: IpLimits,
    /// Per-user rate limits.
    pub per_user: UserLimits,
}

/// Global rate limits for infrastructure protection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalLimits {
    /// Maximum requests per minute globally.
    pub requests_per_minute: u32,
}

/// Per-IP rate limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpLimits {
    /// Sustained requests per minute per IP.
    pub requests_per_minute: u32,
    /// Extra requests tolerated on top of the sustained rate within one window.
    pub burst: u32,
}

/// Per-user rate limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserLimits {
    /// General API requests per minute.
    pub requests_per_minute: u32,
    /// Checkout sessions a user may open per minute.
    pub checkout_per_minute: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            global: GlobalLimits {
                requests_per_minute: 10_000,
            },
            per_ip: IpLimits {
                requests_per_minute: 100,
                burst: 20,
            },
            per_user: UserLimits {
                requests_per_minute: 120,
                checkout_per_minute: 10,
            },
        }
    }
}

impl IpLimits {
    /// Requests allowed in a single window, burst included.
    pub fn window_limit(&self) -> u32 {
        self.requests_per_minute.saturating_add(self.burst)
    }
}

impl RateLimitConfig {
    /// Returns `(limit, window_secs)` for a key.
    pub fn limits_for(&self, key: &RateLimitKey) -> (u32, u32) {
        let limit = match key.scope {
            RateLimitScope::Global => self.global.requests_per_minute,
            RateLimitScope::Ip => self.per_ip.window_limit(),
            RateLimitScope::User => match key.resource.as_deref() {
                Some(CHECKOUT_RESOURCE) => self.per_user.checkout_per_minute,
                _ => self.per_user.requests_per_minute,
            },
        };
        (limit, WINDOW_SECS)
    }
}
