//! Rate limiting middleware for axum.
//!
//! Checks scopes in order:
//! 1. Global rate limit (infrastructure protection)
//! 2. Per-IP rate limit
//! 3. Per-user rate limit (if authenticated)
//!
//! Status is reported in the usual headers:
//! - `X-RateLimit-Limit`: Maximum requests allowed in the window
//! - `X-RateLimit-Remaining`: Requests remaining in the current window
//! - `X-RateLimit-Reset`: Unix timestamp when the window resets
//! - `Retry-After`: Seconds to wait (only on 429 response)
//!
//! A limiter that errors lets the request through.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::domain::foundation::{AuthenticatedUser, UserId};
use crate::ports::{RateLimitDenied, RateLimitKey, RateLimitResult, RateLimitStatus, RateLimiter};

use super::super::error::ErrorResponse;

/// Rate limiter middleware state.
pub type RateLimiterState = Arc<dyn RateLimiter>;

/// Standard rate limit header names.
pub mod headers {
    use super::HeaderName;

    pub static X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
    pub static X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
    pub static X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");
}

/// Rate limiting middleware that checks global, IP, and user limits.
///
/// Must run after `auth_middleware` for the user scope to apply.
/// Headers on the response reflect the most specific scope checked.
pub async fn rate_limit_middleware(
    State(limiter): State<RateLimiterState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request,
    next: Next,
) -> Response {
    let client_ip = extract_client_ip(&request, connect_info.as_ref());
    let user = request.extensions().get::<AuthenticatedUser>().cloned();

    let mut keys = vec![RateLimitKey::global()];
    if let Some(ip) = &client_ip {
        keys.push(RateLimitKey::ip(ip));
    }
    if let Some(user) = &user {
        keys.push(RateLimitKey::user(&user.id));
    }

    let mut reported: Option<RateLimitStatus> = None;
    for key in keys {
        let scope = key.scope;
        match limiter.check(key).await {
            Ok(RateLimitResult::Allowed(status)) => reported = Some(status),
            Ok(RateLimitResult::Denied(denied)) => {
                tracing::info!(scope = %denied.scope, ip = ?client_ip, "Rate limit exceeded");
                return RateLimitRejection::from(denied).into_response();
            }
            Err(e) => {
                tracing::warn!(scope = %scope, error = %e, "Rate limiter unavailable, allowing request");
            }
        }
    }

    let mut response = next.run(request).await;
    if let Some(status) = reported {
        add_rate_limit_headers(&mut response, &status);
    }
    response
}

/// Extract client IP from request, checking forwarded headers first.
///
/// Order of precedence:
/// 1. X-Forwarded-For header (first IP in list)
/// 2. X-Real-IP header
/// 3. ConnectInfo socket address
fn extract_client_ip<B>(
    request: &axum::http::Request<B>,
    connect_info: Option<&ConnectInfo<SocketAddr>>,
) -> Option<String> {
    let header_str = |name: &str| {
        request
            .headers()
            .get(name)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    if let Some(first_ip) = header_str("X-Forwarded-For")
        .and_then(|forwarded| forwarded.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
    {
        return Some(first_ip.to_string());
    }

    if let Some(real_ip) = header_str("X-Real-IP") {
        return Some(real_ip.to_string());
    }

    connect_info.map(|ci| ci.0.ip().to_string())
}

fn add_rate_limit_headers(response: &mut Response, status: &RateLimitStatus) {
    let headers = response.headers_mut();
    headers.insert(headers::X_RATELIMIT_LIMIT.clone(), HeaderValue::from(status.limit));
    headers.insert(
        headers::X_RATELIMIT_REMAINING.clone(),
        HeaderValue::from(status.remaining),
    );
    headers.insert(
        headers::X_RATELIMIT_RESET.clone(),
        HeaderValue::from(status.reset_at.as_unix_secs()),
    );
}

/// Per-resource check used inside handlers, e.g. the checkout quota.
#[derive(Clone)]
pub struct RateLimitCheck {
    limiter: Arc<dyn RateLimiter>,
}

impl RateLimitCheck {
    pub fn new(limiter: Arc<dyn RateLimiter>) -> Self {
        Self { limiter }
    }

    /// Consumes one request from the user's quota for `resource`.
    ///
    /// Fails open when the limiter is unavailable.
    pub async fn check_resource(
        &self,
        user_id: &UserId,
        resource: &str,
    ) -> Result<(), RateLimitRejection> {
        let key = RateLimitKey::user_resource(user_id, resource);
        match self.limiter.check(key).await {
            Ok(RateLimitResult::Allowed(_)) => Ok(()),
            Ok(RateLimitResult::Denied(denied)) => {
                tracing::info!(user_id = %user_id, resource, "Resource rate limit exceeded");
                Err(denied.into())
            }
            Err(e) => {
                tracing::warn!(resource, error = %e, "Rate limiter unavailable, allowing request");
                Ok(())
            }
        }
    }
}

/// 429 response for an exceeded limit.
#[derive(Debug, Clone)]
pub struct RateLimitRejection {
    pub limit: u32,
    pub retry_after_secs: u32,
    pub message: String,
}

impl From<RateLimitDenied> for RateLimitRejection {
    fn from(denied: RateLimitDenied) -> Self {
        Self {
            limit: denied.limit,
            retry_after_secs: denied.retry_after_secs,
            message: denied.message,
        }
    }
}

impl IntoResponse for RateLimitRejection {
    fn into_response(self) -> Response {
        let reset_at = crate::domain::foundation::Timestamp::now()
            .add_secs(i64::from(self.retry_after_secs))
            .as_unix_secs();

        let mut response = (
            StatusCode::TOO_MANY_REQUESTS,
            ErrorResponse::json("RATE_LIMIT_EXCEEDED", self.message),
        )
            .into_response();

        let headers = response.headers_mut();
        headers.insert(headers::X_RATELIMIT_LIMIT.clone(), HeaderValue::from(self.limit));
        headers.insert(headers::X_RATELIMIT_REMAINING.clone(), HeaderValue::from(0u32));
        headers.insert(headers::X_RATELIMIT_RESET.clone(), HeaderValue::from(reset_at));
        headers.insert(header::RETRY_AFTER, HeaderValue::from(self.retry_after_secs));
        response
    }
}
