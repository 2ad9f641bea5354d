//! Integration tests for the HTTP surface.
//!
//! Drives the full router (auth, rate limiting, handlers) with
//! `tower::ServiceExt::oneshot` over in-memory adapters.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use rust_decimal_macros::dec;
use secrecy::SecretString;
use serde_json::{json, Value};
use tower::ServiceExt;

use course_checkout::adapters::auth::MockSessionValidator;
use course_checkout::adapters::email::RecordingNotificationSender;
use course_checkout::adapters::http::middleware::RateLimitCheck;
use course_checkout::adapters::http::{build_router, CheckoutAppState, RouterConfig};
use course_checkout::adapters::memory::InMemoryStore;
use course_checkout::adapters::rate_limiter::{InMemoryRateLimiter, RateLimitConfig};
use course_checkout::adapters::stripe::MockPaymentProvider;
use course_checkout::domain::cart::{CartItem, CartLine};
use course_checkout::domain::catalog::{ContentType, Subject};
use course_checkout::domain::checkout::{CartCheckout, CheckoutMetadata};
use course_checkout::domain::foundation::{ContentTypeId, Money, SubjectId, Timestamp, UserId};
use course_checkout::domain::webhook::{signature_header, StripeWebhookVerifier};

const WEBHOOK_SECRET: &str = "whsec_http_secret";
const TOKEN: &str = "token-learner";

// =============================================================================
// Test Infrastructure
// =============================================================================

struct TestApp {
    router: Router,
    store: InMemoryStore,
    provider: Arc<MockPaymentProvider>,
    user: UserId,
    subject: SubjectId,
    content_type: ContentTypeId,
}

async fn test_app(rate_limit: RateLimitConfig) -> TestApp {
    let store = InMemoryStore::new();
    let subject = SubjectId::new();
    let content_type = ContentTypeId::new();
    store.seed_subject(Subject::new(subject, "Linear Algebra")).await;
    store.seed_content_type(ContentType::new(content_type, "Videos")).await;
    store
        .seed_course_price(
            subject,
            CartLine::Single {
                content_type_id: content_type,
            },
            Money::try_new(dec!(30)).unwrap(),
        )
        .await;

    let shared = Arc::new(store.clone());
    let provider = Arc::new(MockPaymentProvider::new());
    let limiter = Arc::new(InMemoryRateLimiter::new(rate_limit.clone()));

    let state = CheckoutAppState {
        carts: shared.clone(),
        offers: shared.clone(),
        catalog: shared.clone(),
        purchases: shared.clone(),
        ledger: shared.clone(),
        access: shared.clone(),
        bookings: shared.clone(),
        webhook_events: shared,
        payment_provider: provider.clone(),
        notifier: Arc::new(RecordingNotificationSender::new()),
        webhook_verifier: StripeWebhookVerifier::new(SecretString::new(
            WEBHOOK_SECRET.to_string(),
        )),
        rate_limit: RateLimitCheck::new(limiter.clone()),
        public_base_url: Some("https://shop.example.com".to_string()),
    };

    let auth = Arc::new(MockSessionValidator::new().with_test_user(TOKEN, "learner-1"));
    let config = RouterConfig {
        rate_limit_enabled: rate_limit.enabled,
        ..RouterConfig::default()
    };

    TestApp {
        router: build_router(state, auth, limiter, &config),
        store,
        provider,
        user: UserId::new("learner-1").unwrap(),
        subject,
        content_type,
    }
}

fn authed(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", TOKEN))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn webhook(body: &Value, secret: &str) -> Request<Body> {
    let payload = serde_json::to_vec(body).unwrap();
    let signature = signature_header(secret, Timestamp::now().as_unix_secs(), &payload);
    Request::builder()
        .method("POST")
        .uri("/api/webhooks/stripe")
        .header("Stripe-Signature", signature)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn completed_event(app: &TestApp, event_id: &str) -> Value {
    let item = CartItem::single(
        app.user.clone(),
        app.subject,
        app.content_type,
        Money::try_new(dec!(30)).unwrap(),
    );
    app.store.seed_cart_item(item.clone()).await;
    let metadata = CheckoutMetadata::Cart(CartCheckout {
        user_id: app.user.clone(),
        cart_item_ids: vec![item.id],
        line_amounts: vec![item.price],
        offer: None,
    })
    .to_provider_metadata()
    .unwrap();

    json!({
        "id": event_id,
        "type": "checkout.session.completed",
        "created": Timestamp::now().as_unix_secs(),
        "data": { "object": {
            "id": "cs_http_1",
            "payment_intent": "pi_http_1",
            "amount_total": 3000,
            "payment_status": "paid",
            "metadata": metadata,
        }},
    })
}

// =============================================================================
// Webhook
// =============================================================================

#[tokio::test]
async fn signed_webhook_is_acknowledged_and_reconciled() {
    let app = test_app(RateLimitConfig::default()).await;
    let body = completed_event(&app, "evt_http_1").await;

    let response = app.router.clone().oneshot(webhook(&body, WEBHOOK_SECRET)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({ "received": true }));
    assert_eq!(app.store.purchases().await.len(), 1);
    assert_eq!(app.store.access_for(&app.user).await.len(), 1);
}

#[tokio::test]
async fn duplicate_delivery_is_acknowledged_once() {
    let app = test_app(RateLimitConfig::default()).await;
    let body = completed_event(&app, "evt_http_dup").await;

    let first = app.router.clone().oneshot(webhook(&body, WEBHOOK_SECRET)).await.unwrap();
    let second = app.router.clone().oneshot(webhook(&body, WEBHOOK_SECRET)).await.unwrap();

    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(app.store.purchases().await.len(), 1);
    assert_eq!(app.store.webhook_event_count().await, 1);
}

#[tokio::test]
async fn webhook_with_wrong_secret_is_rejected() {
    let app = test_app(RateLimitConfig::default()).await;
    let body = completed_event(&app, "evt_http_forged").await;

    let response = app.router.clone().oneshot(webhook(&body, "whsec_forged")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(app.store.purchases().await.is_empty());
}

#[tokio::test]
async fn webhook_without_signature_is_rejected() {
    let app = test_app(RateLimitConfig::default()).await;
    let request = Request::builder()
        .method("POST")
        .uri("/api/webhooks/stripe")
        .body(Body::from("{}"))
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn webhook_failure_returns_server_error_for_retry() {
    let app = test_app(RateLimitConfig::default()).await;
    let body = completed_event(&app, "evt_http_fail").await;
    app.store.set_fail_writes(true);

    let response = app.router.clone().oneshot(webhook(&body, WEBHOOK_SECRET)).await.unwrap();

    assert!(response.status().is_server_error());
    assert_eq!(app.store.webhook_event_count().await, 0);
}

// =============================================================================
// Storefront API
// =============================================================================

#[tokio::test]
async fn health_needs_no_auth() {
    let app = test_app(RateLimitConfig::default()).await;
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn cart_requires_authentication() {
    let app = test_app(RateLimitConfig::default()).await;
    let request = Request::builder().uri("/api/cart").body(Body::empty()).unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn add_to_cart_then_checkout_charges_catalog_price() {
    let app = test_app(RateLimitConfig::default()).await;

    let added = app
        .router
        .clone()
        .oneshot(authed(
            "POST",
            "/api/cart",
            json!({
                "subjectId": app.subject.to_string(),
                "contentTypeId": app.content_type.to_string(),
                "price": "0.01",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(added.status(), StatusCode::CREATED);
    let item = json_body(added).await;
    let price: rust_decimal::Decimal = item["price"].as_str().unwrap().parse().unwrap();
    assert_eq!(price, dec!(30));

    let response = app
        .router
        .clone()
        .oneshot(authed("POST", "/api/checkout", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["sessionId"], "cs_test_1");
    assert!(body["url"].as_str().unwrap().starts_with("https://"));

    let request = app.provider.last_request().unwrap();
    assert_eq!(request.line_items[0].unit_amount, Money::try_new(dec!(30)).unwrap());
    assert!(request.success_url.starts_with("https://shop.example.com"));
    assert!(request.success_url.contains("{CHECKOUT_SESSION_ID}"));
}

#[tokio::test]
async fn add_to_cart_for_unlisted_subject_is_not_found() {
    let app = test_app(RateLimitConfig::default()).await;

    let response = app
        .router
        .clone()
        .oneshot(authed(
            "POST",
            "/api/cart",
            json!({ "subjectId": SubjectId::new().to_string(), "isBundle": true }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(app.store.cart_for(&app.user).await.is_empty());
}

#[tokio::test]
async fn checkout_over_line_limit_is_a_client_error() {
    let app = test_app(RateLimitConfig::default()).await;
    for _ in 0..13 {
        app.store
            .seed_cart_item(CartItem::bundle(
                app.user.clone(),
                SubjectId::new(),
                Money::try_new(dec!(10)).unwrap(),
            ))
            .await;
    }

    let response = app
        .router
        .clone()
        .oneshot(authed("POST", "/api/checkout", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(app.provider.created_requests().is_empty());
}

#[tokio::test]
async fn checkout_with_empty_cart_is_a_client_error() {
    let app = test_app(RateLimitConfig::default()).await;

    let response = app
        .router
        .clone()
        .oneshot(authed("POST", "/api/checkout", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(app.provider.created_requests().is_empty());
}

#[tokio::test]
async fn checkout_quota_returns_429_with_retry_after() {
    let mut limits = RateLimitConfig::default();
    limits.per_user.checkout_per_minute = 1;
    let app = test_app(limits).await;
    app.store
        .seed_cart_item(CartItem::bundle(
            app.user.clone(),
            app.subject,
            Money::try_new(dec!(80)).unwrap(),
        ))
        .await;

    let first = app
        .router
        .clone()
        .oneshot(authed("POST", "/api/checkout", json!({})))
        .await
        .unwrap();
    let second = app
        .router
        .clone()
        .oneshot(authed("POST", "/api/checkout", json!({})))
        .await
        .unwrap();

    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(second.headers().contains_key(header::RETRY_AFTER));
    assert_eq!(json_body(second).await["code"], "RATE_LIMIT_EXCEEDED");
    assert_eq!(app.provider.created_requests().len(), 1);
}

#[tokio::test]
async fn access_lists_granted_content_after_webhook() {
    let app = test_app(RateLimitConfig::default()).await;
    let body = completed_event(&app, "evt_http_access").await;
    app.router.clone().oneshot(webhook(&body, WEBHOOK_SECRET)).await.unwrap();

    let request = Request::builder()
        .uri("/api/access")
        .header(header::AUTHORIZATION, format!("Bearer {}", TOKEN))
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body.as_array().map(Vec::len), Some(1));
}
