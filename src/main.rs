//! course-checkout server binary.
//!
//! Loads configuration from the environment, wires the PostgreSQL, Stripe,
//! Resend and rate limiter adapters, and serves the storefront API.

use std::net::SocketAddr;
use std::sync::Arc;

use secrecy::SecretString;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use course_checkout::adapters::auth::{JwtConfig, JwtSessionValidator};
use course_checkout::adapters::email::{ResendConfig, ResendNotificationSender};
use course_checkout::adapters::http::middleware::{AuthState, RateLimitCheck, RateLimiterState};
use course_checkout::adapters::http::{build_router, CheckoutAppState, RouterConfig};
use course_checkout::adapters::postgres::{
    run_migrations, PostgresBookingRepository, PostgresCartRepository, PostgresCatalogReader,
    PostgresOfferRepository, PostgresPurchaseLedger, PostgresPurchaseRepository,
    PostgresUserAccessRepository, PostgresWebhookEventRepository,
};
use course_checkout::adapters::rate_limiter::{InMemoryRateLimiter, RedisRateLimiter};
use course_checkout::adapters::stripe::{StripeConfig, StripePaymentAdapter};
use course_checkout::adapters::webhook_retention::{WebhookRetention, WebhookRetentionConfig};
use course_checkout::config::AppConfig;
use course_checkout::domain::webhook::StripeWebhookVerifier;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config.server.log_level, config.is_production());
    config.validate()?;

    tracing::info!(
        environment = ?config.server.environment,
        database = %config.database.redacted_url(),
        stripe_test_mode = config.payment.is_test_mode(),
        "Configuration loaded"
    );

    let pool = config
        .database
        .pool_options()
        .connect(&config.database.url)
        .await?;
    if config.database.run_migrations {
        run_migrations(&pool).await?;
        tracing::info!("Migrations applied");
    }

    let mut stripe = StripeConfig::new(SecretString::new(config.payment.stripe_api_key.clone()))
        .with_currency(config.payment.currency.clone());
    if let Some(base_url) = &config.payment.api_base_url {
        stripe = stripe.with_base_url(base_url.clone());
    }

    let mut resend = ResendConfig::new(
        SecretString::new(config.email.resend_api_key.clone()),
        config.email.from_header(),
    );
    if let Some(api_url) = &config.email.api_url {
        resend = resend.with_api_url(api_url.clone());
    }

    let mut jwt = JwtConfig::new(
        SecretString::new(config.auth.jwt_secret.clone()),
        config.auth.jwt_issuer.clone(),
        config.auth.jwt_audience.clone(),
    );
    jwt.leeway_secs = config.auth.leeway_secs;
    let auth: AuthState = Arc::new(JwtSessionValidator::new(&jwt));

    let limiter: RateLimiterState = match &config.redis {
        Some(redis) => {
            let connect = RedisRateLimiter::connect(&redis.url, config.rate_limit.clone());
            let limiter = tokio::time::timeout(redis.timeout(), connect).await??;
            tracing::info!(redis = %redis.redacted_url(), "Using Redis rate limiter");
            Arc::new(limiter)
        }
        None => {
            tracing::info!("Using in-memory rate limiter");
            Arc::new(InMemoryRateLimiter::new(config.rate_limit.clone()))
        }
    };

    let webhook_events = Arc::new(PostgresWebhookEventRepository::new(pool.clone()));
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let retention = WebhookRetention::new(
        webhook_events.clone(),
        WebhookRetentionConfig {
            retention: config.payment.webhook_retention(),
            interval: config.payment.webhook_sweep_interval(),
        },
    );
    let retention_task = tokio::spawn(async move { retention.run(shutdown_rx).await });

    let state = CheckoutAppState {
        carts: Arc::new(PostgresCartRepository::new(pool.clone())),
        offers: Arc::new(PostgresOfferRepository::new(pool.clone())),
        catalog: Arc::new(PostgresCatalogReader::new(pool.clone())),
        purchases: Arc::new(PostgresPurchaseRepository::new(pool.clone())),
        ledger: Arc::new(PostgresPurchaseLedger::new(pool.clone())),
        access: Arc::new(PostgresUserAccessRepository::new(pool.clone())),
        bookings: Arc::new(PostgresBookingRepository::new(pool.clone())),
        webhook_events,
        payment_provider: Arc::new(StripePaymentAdapter::new(stripe)),
        notifier: Arc::new(ResendNotificationSender::new(resend)),
        webhook_verifier: StripeWebhookVerifier::new(SecretString::new(
            config.payment.stripe_webhook_secret.clone(),
        )),
        rate_limit: RateLimitCheck::new(limiter.clone()),
        public_base_url: config.server.public_base_url.clone(),
    };

    let router_config = RouterConfig {
        request_timeout: config.server.request_timeout(),
        cors_origins: config.server.cors_origins_list(),
        permissive_cors: !config.is_production(),
        rate_limit_enabled: config.rate_limit.enabled,
    };
    let app = build_router(state, auth, limiter, &router_config);

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "course-checkout listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    let _ = shutdown_tx.send(true);
    if let Err(e) = retention_task.await {
        tracing::warn!(error = %e, "Webhook retention task did not stop cleanly");
    }

    tracing::info!("Server stopped");
    Ok(())
}

/// `RUST_LOG` wins over the configured level; production logs are JSON.
fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        let _ = builder.json().try_init();
    } else {
        let _ = builder.try_init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
}
