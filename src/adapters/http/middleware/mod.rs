//! HTTP middleware for axum.
//!
//! - `auth` - Bearer token validation and extractors
//! - `rate_limit` - Global, per-IP and per-user quotas

pub mod auth;
pub mod rate_limit;

pub use auth::{auth_middleware, AuthRejection, AuthState, OptionalAuth, RequireAuth};
pub use rate_limit::{
    rate_limit_middleware, RateLimitCheck, RateLimitRejection, RateLimiterState,
};
