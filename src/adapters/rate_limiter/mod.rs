//! Rate limiter adapters.
//!
//! - `InMemoryRateLimiter` - tests and single-instance deployments
//! - `RedisRateLimiter` - shared counters for multi-instance deployments
//!
//! ```ignore
//! use course_checkout::adapters::rate_limiter::{InMemoryRateLimiter, RateLimitConfig};
//!
//! let limiter = InMemoryRateLimiter::with_defaults();
//! let limiter = RedisRateLimiter::connect("redis://127.0.0.1/", RateLimitConfig::default()).await?;
//! ```

mod config;
mod in_memory;
mod redis;

pub use config::{
    GlobalLimits, IpLimits, RateLimitConfig, UserLimits, CHECKOUT_RESOURCE, WINDOW_SECS,
};
pub use in_memory::InMemoryRateLimiter;
pub use redis::RedisRateLimiter;
