//! Top-level router: storefront API, webhooks, health, and the
//! cross-cutting tower layers.

use std::time::Duration;

use axum::http::HeaderValue;
use axum::routing::get;
use axum::{Json, Router};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::checkout::{api_routes, webhook_routes, CheckoutAppState};
use super::middleware::{auth_middleware, rate_limit_middleware, AuthState, RateLimiterState};

/// Router settings taken from the server config.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    pub request_timeout: Duration,
    /// Exact origins allowed by CORS.
    pub cors_origins: Vec<String>,
    /// Allow any origin when `cors_origins` is empty (development only).
    pub permissive_cors: bool,
    /// Skip the rate limit layer entirely.
    pub rate_limit_enabled: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            cors_origins: Vec::new(),
            permissive_cors: true,
            rate_limit_enabled: true,
        }
    }
}

/// Builds the application router.
///
/// `/api/*` routes pass through auth then rate limiting. The webhook
/// route skips both: Stripe signs its requests and retries on its own.
pub fn build_router(
    state: CheckoutAppState,
    auth: AuthState,
    limiter: RateLimiterState,
    config: &RouterConfig,
) -> Router {
    let mut api = api_routes();
    if config.rate_limit_enabled {
        api = api.layer(axum::middleware::from_fn_with_state(
            limiter,
            rate_limit_middleware,
        ));
    }
    let api = api.layer(axum::middleware::from_fn_with_state(auth, auth_middleware));

    Router::new()
        .route("/health", get(health))
        .nest("/api/webhooks", webhook_routes())
        .nest("/api", api)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(config.request_timeout))
                .layer(cors_layer(config))
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
}

fn cors_layer(config: &RouterConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    if !origins.is_empty() {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    } else if config.permissive_cors {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
    }
}

/// GET /health - Liveness check
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
