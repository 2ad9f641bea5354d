//! Redis-backed rate limiter for multi-instance deployments.
//!
//! Uses a fixed-window counter with Redis INCR + EXPIRE, so every
//! instance shares the same counters.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::domain::foundation::Timestamp;
use crate::ports::{
    RateLimitDenied, RateLimitError, RateLimitKey, RateLimitResult, RateLimitStatus, RateLimiter,
};

use super::config::RateLimitConfig;

/// Redis-backed rate limiter.
///
/// Fixed-window counter:
/// 1. INCR the key to increment the counter
/// 2. If count is 1, set EXPIRE for the window duration
/// 3. If count > limit, deny the request
///
/// Requests can briefly exceed the limit across a window boundary.
#[derive(Clone)]
pub struct RedisRateLimiter {
    conn: MultiplexedConnection,
    config: RateLimitConfig,
}

impl RedisRateLimiter {
    pub fn new(conn: MultiplexedConnection, config: RateLimitConfig) -> Self {
        Self { conn, config }
    }

    /// Connects to `url` and builds a limiter.
    pub async fn connect(url: &str, config: RateLimitConfig) -> Result<Self, RateLimitError> {
        let client = redis::Client::open(url).map_err(unavailable)?;
        let conn = client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(unavailable)?;
        Ok(Self::new(conn, config))
    }

    /// Seconds left in the window, falling back to the full window when the
    /// key has no TTL.
    async fn seconds_to_reset(
        conn: &mut MultiplexedConnection,
        redis_key: &str,
        window_secs: u32,
    ) -> Result<u32, RateLimitError> {
        let ttl: i64 = conn.ttl(redis_key).await.map_err(unavailable)?;
        Ok(u32::try_from(ttl)
            .ok()
            .filter(|ttl| *ttl > 0)
            .unwrap_or(window_secs))
    }
}

fn unavailable(e: redis::RedisError) -> RateLimitError {
    RateLimitError::Unavailable(e.to_string())
}

fn reset_at(seconds_from_now: u32) -> Timestamp {
    Timestamp::now().add_secs(i64::from(seconds_from_now))
}

#[async_trait]
impl RateLimiter for RedisRateLimiter {
    async fn check(&self, key: RateLimitKey) -> Result<RateLimitResult, RateLimitError> {
        let redis_key = key.counter_key();
        let (limit, window_secs) = self.config.limits_for(&key);
        let mut conn = self.conn.clone();

        let count: i64 = conn.incr(&redis_key, 1_i64).await.map_err(unavailable)?;

        if count == 1 {
            conn.expire::<_, ()>(&redis_key, i64::from(window_secs))
                .await
                .map_err(unavailable)?;
        }

        let reset_secs = Self::seconds_to_reset(&mut conn, &redis_key, window_secs).await?;
        let count = u32::try_from(count).unwrap_or(u32::MAX);

        if count > limit {
            return Ok(RateLimitResult::Denied(RateLimitDenied {
                limit,
                retry_after_secs: reset_secs.max(1),
                scope: key.scope,
                message: format!(
                    "Rate limit exceeded for {}. Retry after {} seconds.",
                    key.scope,
                    reset_secs.max(1)
                ),
            }));
        }

        Ok(RateLimitResult::Allowed(RateLimitStatus {
            limit,
            remaining: limit.saturating_sub(count),
            reset_at: reset_at(reset_secs),
            window_secs,
        }))
    }

    async fn status(&self, key: RateLimitKey) -> Result<RateLimitStatus, RateLimitError> {
        let redis_key = key.counter_key();
        let (limit, window_secs) = self.config.limits_for(&key);
        let mut conn = self.conn.clone();

        let count: Option<i64> = conn.get(&redis_key).await.map_err(unavailable)?;
        let count = u32::try_from(count.unwrap_or(0)).unwrap_or(u32::MAX);
        let reset_secs = Self::seconds_to_reset(&mut conn, &redis_key, window_secs).await?;

        Ok(RateLimitStatus {
            limit,
            remaining: limit.saturating_sub(count),
            reset_at: reset_at(reset_secs),
            window_secs,
        })
    }

    async fn reset(&self, key: RateLimitKey) -> Result<(), RateLimitError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key.counter_key())
            .await
            .map_err(unavailable)?;
        Ok(())
    }
}

impl std::fmt::Debug for RedisRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisRateLimiter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
