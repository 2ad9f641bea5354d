//! In-memory rate limiter implementation for tests and single-instance runs.
//!
//! Uses a fixed-window counter algorithm with an in-memory HashMap.
//! Counters are per process: with several instances behind a load
//! balancer each one enforces its own quota. Use `RedisRateLimiter` there.
//!
//! Every key gets its own window, so expired windows are swept out every
//! [`SWEEP_EVERY`] checks to keep the map bounded by recent traffic.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::Timestamp;
use crate::ports::{
    RateLimitDenied, RateLimitError, RateLimitKey, RateLimitResult, RateLimitStatus, RateLimiter,
};

use super::config::RateLimitConfig;

/// Checks between sweeps of expired windows.
pub const SWEEP_EVERY: u64 = 1024;

/// In-memory rate limiter.
#[derive(Debug)]
pub struct InMemoryRateLimiter {
    config: RateLimitConfig,
    windows: Arc<RwLock<HashMap<String, WindowState>>>,
    checks: AtomicU64,
}

/// State for a single rate limit window.
#[derive(Debug, Clone)]
struct WindowState {
    count: u32,
    /// Unix seconds.
    window_start: i64,
    window_secs: u32,
}

impl WindowState {
    fn window_end(&self) -> i64 {
        self.window_start + i64::from(self.window_secs)
    }
}

impl InMemoryRateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Arc::new(RwLock::new(HashMap::new())),
            checks: AtomicU64::new(0),
        }
    }

    /// Create a rate limiter with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(RateLimitConfig::default())
    }

    /// Drops every window that has run out; returns how many.
    pub async fn purge_expired(&self) -> usize {
        let now = Timestamp::now().as_unix_secs();
        let mut windows = self.windows.write().await;
        Self::sweep(&mut windows, now)
    }

    /// Number of keys currently holding a window.
    pub async fn tracked_keys(&self) -> usize {
        self.windows.read().await.len()
    }

    fn sweep(windows: &mut HashMap<String, WindowState>, now: i64) -> usize {
        let before = windows.len();
        windows.retain(|_, state| now < state.window_end());
        let removed = before - windows.len();
        if removed > 0 {
            tracing::debug!(removed, remaining = windows.len(), "Expired rate limit windows swept");
        }
        removed
    }

    fn reset_at(unix_secs: i64) -> Timestamp {
        Timestamp::from_unix_secs(unix_secs).unwrap_or_else(Timestamp::now)
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn check(&self, key: RateLimitKey) -> Result<RateLimitResult, RateLimitError> {
        let store_key = key.counter_key();
        let (limit, window_secs) = self.config.limits_for(&key);
        let now = Timestamp::now().as_unix_secs();

        let mut windows = self.windows.write().await;
        if self.checks.fetch_add(1, Ordering::Relaxed) % SWEEP_EVERY == 0 {
            Self::sweep(&mut windows, now);
        }

        let state = windows.entry(store_key).or_insert_with(|| WindowState {
            count: 0,
            window_start: now,
            window_secs,
        });

        if now >= state.window_end() {
            state.count = 0;
            state.window_start = now;
        }

        if state.count >= limit {
            let retry_after = u32::try_from(state.window_end().saturating_sub(now)).unwrap_or(0);

            return Ok(RateLimitResult::Denied(RateLimitDenied {
                limit,
                retry_after_secs: retry_after.max(1),
                scope: key.scope,
                message: format!(
                    "Rate limit exceeded for {}. Retry after {} seconds.",
                    key.scope,
                    retry_after.max(1)
                ),
            }));
        }

        state.count += 1;

        Ok(RateLimitResult::Allowed(RateLimitStatus {
            limit,
            remaining: limit.saturating_sub(state.count),
            reset_at: Self::reset_at(state.window_end()),
            window_secs,
        }))
    }

    async fn status(&self, key: RateLimitKey) -> Result<RateLimitStatus, RateLimitError> {
        let store_key = key.counter_key();
        let (limit, window_secs) = self.config.limits_for(&key);
        let now = Timestamp::now().as_unix_secs();

        let windows = self.windows.read().await;

        let (count, window_start) = windows
            .get(&store_key)
            .filter(|state| now < state.window_end())
            .map(|state| (state.count, state.window_start))
            .unwrap_or((0, now));

        Ok(RateLimitStatus {
            limit,
            remaining: limit.saturating_sub(count),
            reset_at: Self::reset_at(window_start + i64::from(window_secs)),
            window_secs,
        })
    }

    async fn reset(&self, key: RateLimitKey) -> Result<(), RateLimitError> {
        self.windows.write().await.remove(&key.counter_key());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::rate_limiter::CHECKOUT_RESOURCE;
    use crate::domain::foundation::UserId;
    use crate::ports::RateLimitScope;

    fn test_user_id() -> UserId {
        UserId::new("test-user-123").unwrap()
    }

    fn ip_limited(requests_per_minute: u32) -> InMemoryRateLimiter {
        let mut config = RateLimitConfig::default();
        config.per_ip.requests_per_minute = requests_per_minute;
        config.per_ip.burst = 0;
        InMemoryRateLimiter::new(config)
    }

    #[tokio::test]
    async fn allows_requests_within_limit() {
        let limiter = InMemoryRateLimiter::with_defaults();
        let key = RateLimitKey::ip("192.168.1.1");

        for i in 0..10 {
            let result = limiter.check(key.clone()).await.unwrap();
            assert!(result.is_allowed(), "Request {} should be allowed", i + 1);
        }
    }

    #[tokio::test]
    async fn denies_requests_at_limit() {
        let limiter = ip_limited(5);
        let key = RateLimitKey::ip("192.168.1.1");

        for _ in 0..5 {
            assert!(limiter.check(key.clone()).await.unwrap().is_allowed());
        }

        let result = limiter.check(key.clone()).await.unwrap();
        match result {
            RateLimitResult::Denied(denied) => {
                assert_eq!(denied.limit, 5);
                assert!(denied.retry_after_secs > 0);
                assert_eq!(denied.scope, RateLimitScope::Ip);
            }
            other => panic!("expected denial, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn burst_extends_ip_window() {
        let mut config = RateLimitConfig::default();
        config.per_ip.requests_per_minute = 2;
        config.per_ip.burst = 1;
        let limiter = InMemoryRateLimiter::new(config);
        let key = RateLimitKey::ip("10.1.1.1");

        for _ in 0..3 {
            assert!(limiter.check(key.clone()).await.unwrap().is_allowed());
        }
        assert!(limiter.check(key).await.unwrap().is_denied());
    }

    #[tokio::test]
    async fn status_returns_remaining_count() {
        let limiter = ip_limited(10);
        let key = RateLimitKey::ip("10.0.0.1");

        let status = limiter.status(key.clone()).await.unwrap();
        assert_eq!(status.limit, 10);
        assert_eq!(status.remaining, 10);

        for _ in 0..3 {
            limiter.check(key.clone()).await.unwrap();
        }

        let status = limiter.status(key.clone()).await.unwrap();
        assert_eq!(status.remaining, 7);
    }

    #[tokio::test]
    async fn reset_clears_counter() {
        let limiter = ip_limited(5);
        let key = RateLimitKey::ip("10.0.0.2");

        for _ in 0..5 {
            limiter.check(key.clone()).await.unwrap();
        }
        assert!(limiter.check(key.clone()).await.unwrap().is_denied());

        limiter.reset(key.clone()).await.unwrap();

        assert!(limiter.check(key.clone()).await.unwrap().is_allowed());
    }

    #[tokio::test]
    async fn global_limit_applies_to_all_requests() {
        let mut config = RateLimitConfig::default();
        config.global.requests_per_minute = 3;
        let limiter = InMemoryRateLimiter::new(config);

        for _ in 0..3 {
            assert!(limiter.check(RateLimitKey::global()).await.unwrap().is_allowed());
        }
        assert!(limiter.check(RateLimitKey::global()).await.unwrap().is_denied());
    }

    #[tokio::test]
    async fn checkout_quota_is_separate_from_general_user_quota() {
        let mut config = RateLimitConfig::default();
        config.per_user.checkout_per_minute = 1;
        let limiter = InMemoryRateLimiter::new(config);
        let user = test_user_id();
        let checkout = RateLimitKey::user_resource(&user, CHECKOUT_RESOURCE);

        assert!(limiter.check(checkout.clone()).await.unwrap().is_allowed());
        assert!(limiter.check(checkout).await.unwrap().is_denied());
        assert!(limiter.check(RateLimitKey::user(&user)).await.unwrap().is_allowed());
    }

    #[tokio::test]
    async fn different_ips_have_independent_limits() {
        let limiter = ip_limited(3);
        let key1 = RateLimitKey::ip("1.1.1.1");
        let key2 = RateLimitKey::ip("2.2.2.2");

        for _ in 0..3 {
            limiter.check(key1.clone()).await.unwrap();
        }
        assert!(limiter.check(key1).await.unwrap().is_denied());
        assert!(limiter.check(key2).await.unwrap().is_allowed());
    }

    async fn insert_expired(limiter: &InMemoryRateLimiter, key: &RateLimitKey) {
        let long_ago = Timestamp::now().as_unix_secs() - 3_600;
        limiter.windows.write().await.insert(
            key.counter_key(),
            WindowState {
                count: 3,
                window_start: long_ago,
                window_secs: 60,
            },
        );
    }

    #[tokio::test]
    async fn purge_drops_only_expired_windows() {
        let limiter = InMemoryRateLimiter::with_defaults();
        insert_expired(&limiter, &RateLimitKey::ip("203.0.113.7")).await;
        limiter.check(RateLimitKey::ip("203.0.113.8")).await.unwrap();

        assert_eq!(limiter.purge_expired().await, 1);
        assert_eq!(limiter.tracked_keys().await, 1);
    }

    #[tokio::test]
    async fn checks_sweep_expired_windows_periodically() {
        let limiter = InMemoryRateLimiter::with_defaults();
        for i in 0..5 {
            insert_expired(&limiter, &RateLimitKey::ip(&format!("198.51.100.{}", i))).await;
        }

        // The first check of every SWEEP_EVERY sweeps.
        limiter.check(RateLimitKey::ip("192.0.2.1")).await.unwrap();

        assert_eq!(limiter.tracked_keys().await, 1);
    }

    #[tokio::test]
    async fn remaining_decrements_correctly() {
        let limiter = ip_limited(10);
        let key = RateLimitKey::ip("test-ip");

        for expected_remaining in (0..10u32).rev() {
            match limiter.check(key.clone()).await.unwrap() {
                RateLimitResult::Allowed(status) => {
                    assert_eq!(status.remaining, expected_remaining)
                }
                other => panic!("expected allowance, got {:?}", other),
            }
        }
    }
}
