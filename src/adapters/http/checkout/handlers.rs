//! HTTP handlers for the storefront endpoints.
//!
//! These handlers connect axum routes to application layer command/query handlers.

use std::sync::Arc;

use axum::extract::{Json, Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;

use crate::adapters::rate_limiter::CHECKOUT_RESOURCE;
use crate::application::{
    AddToCartCommand, AddToCartHandler, CreateBookingCheckoutCommand,
    CreateBookingCheckoutHandler, CreateCheckoutSessionCommand, CreateCheckoutSessionHandler,
    FailPurchaseHandler, GetCartHandler, GetCartQuery, HandlePaymentWebhookCommand,
    HandlePaymentWebhookHandler, ListAccessHandler, ListAccessQuery, ReconcileCheckoutHandler,
    ReconcileDeps, RemoveFromCartCommand, RemoveFromCartHandler, VerifyCheckoutSessionCommand,
    VerifyCheckoutSessionHandler,
};
use crate::domain::checkout::CheckoutError;
use crate::domain::foundation::CartItemId;
use crate::domain::webhook::{StripeWebhookVerifier, WebhookError};
use crate::ports::{
    BookingRepository, CartRepository, CatalogReader, NotificationSender, OfferRepository,
    PaymentProvider, PurchaseLedger, PurchaseRepository, UserAccessRepository,
    WebhookEventRepository,
};

use super::super::error::{ApiError, WebhookApiError};
use super::super::middleware::{RateLimitCheck, RequireAuth};
use super::dto::{
    AccessResponse, AddToCartRequest, BookingCheckoutResponse, CartItemResponse, CartResponse,
    CheckoutResponse, CreateBookingCheckoutRequest, CreateCheckoutRequest, VerifyCheckoutRequest,
    VerifyCheckoutResponse, WebhookAck,
};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all dependencies.
///
/// Cloned per request; every dependency is behind an `Arc`.
#[derive(Clone)]
pub struct CheckoutAppState {
    pub carts: Arc<dyn CartRepository>,
    pub offers: Arc<dyn OfferRepository>,
    pub catalog: Arc<dyn CatalogReader>,
    pub purchases: Arc<dyn PurchaseRepository>,
    pub ledger: Arc<dyn PurchaseLedger>,
    pub access: Arc<dyn UserAccessRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub webhook_events: Arc<dyn WebhookEventRepository>,
    pub payment_provider: Arc<dyn PaymentProvider>,
    pub notifier: Arc<dyn NotificationSender>,
    pub webhook_verifier: StripeWebhookVerifier,
    pub rate_limit: RateLimitCheck,
    /// Overrides header-derived redirect URLs when set.
    pub public_base_url: Option<String>,
}

impl CheckoutAppState {
    pub fn create_checkout_handler(&self) -> CreateCheckoutSessionHandler {
        CreateCheckoutSessionHandler::new(
            self.carts.clone(),
            self.offers.clone(),
            self.catalog.clone(),
            self.payment_provider.clone(),
        )
    }

    pub fn create_booking_checkout_handler(&self) -> CreateBookingCheckoutHandler {
        CreateBookingCheckoutHandler::new(
            self.catalog.clone(),
            self.bookings.clone(),
            self.payment_provider.clone(),
        )
    }

    pub fn reconcile_handler(&self) -> ReconcileCheckoutHandler {
        ReconcileCheckoutHandler::new(ReconcileDeps {
            purchases: self.purchases.clone(),
            ledger: self.ledger.clone(),
            carts: self.carts.clone(),
            offers: self.offers.clone(),
            catalog: self.catalog.clone(),
            access: self.access.clone(),
            bookings: self.bookings.clone(),
            notifier: self.notifier.clone(),
        })
    }

    pub fn verify_handler(&self) -> VerifyCheckoutSessionHandler {
        VerifyCheckoutSessionHandler::new(
            self.payment_provider.clone(),
            Arc::new(self.reconcile_handler()),
        )
    }

    pub fn webhook_handler(&self) -> HandlePaymentWebhookHandler {
        HandlePaymentWebhookHandler::new(
            self.webhook_verifier.clone(),
            self.webhook_events.clone(),
            Arc::new(self.reconcile_handler()),
            Arc::new(FailPurchaseHandler::new(self.purchases.clone())),
        )
    }

    /// Origin used to build redirect URLs.
    ///
    /// Configured value first, then `X-Forwarded-Proto` (default `http`)
    /// with the `Host` header.
    pub fn resolve_base_url(&self, headers: &HeaderMap) -> Result<String, CheckoutError> {
        if let Some(base) = self.public_base_url.as_deref().filter(|b| !b.is_empty()) {
            return Ok(base.trim_end_matches('/').to_string());
        }

        let host = headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .filter(|h| !h.is_empty())
            .ok_or_else(|| {
                CheckoutError::Validation("Cannot determine base URL: missing Host header".into())
            })?;
        let proto = headers
            .get("X-Forwarded-Proto")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or("http");

        Ok(format!("{}://{}", proto, host))
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Checkout
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/checkout - Open a checkout session for the cart
pub async fn create_checkout(
    State(state): State<CheckoutAppState>,
    RequireAuth(user): RequireAuth,
    headers: HeaderMap,
    Json(request): Json<CreateCheckoutRequest>,
) -> Result<axum::response::Response, ApiError> {
    if let Err(rejection) = state.rate_limit.check_resource(&user.id, CHECKOUT_RESOURCE).await {
        return Ok(rejection.into_response());
    }

    let cmd = CreateCheckoutSessionCommand {
        user_id: user.id,
        customer_email: user.email,
        offer_code: request.offer_code,
        offer_id: request.offer_id,
        base_url: state.resolve_base_url(&headers)?,
    };

    let result = state.create_checkout_handler().handle(cmd).await?;

    Ok(Json(CheckoutResponse {
        session_id: result.session_id,
        url: result.url,
    })
    .into_response())
}

/// POST /api/checkout/booking - Create a pending booking and its checkout session
pub async fn create_booking_checkout(
    State(state): State<CheckoutAppState>,
    RequireAuth(user): RequireAuth,
    headers: HeaderMap,
    Json(request): Json<CreateBookingCheckoutRequest>,
) -> Result<axum::response::Response, ApiError> {
    if let Err(rejection) = state.rate_limit.check_resource(&user.id, CHECKOUT_RESOURCE).await {
        return Ok(rejection.into_response());
    }

    let cmd = CreateBookingCheckoutCommand {
        user_id: Some(user.id),
        session_type_id: request.session_type_id,
        contact_email: request.contact_email,
        contact_name: request.contact_name.or(user.display_name),
        scheduled_at: request.scheduled_at,
        base_url: state.resolve_base_url(&headers)?,
    };

    let result = state.create_booking_checkout_handler().handle(cmd).await?;

    Ok((StatusCode::CREATED, Json(BookingCheckoutResponse::from(result))).into_response())
}

/// POST /api/checkout/verify - Success-page fallback for a late webhook
pub async fn verify_checkout(
    State(state): State<CheckoutAppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<VerifyCheckoutRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = VerifyCheckoutSessionCommand {
        user_id: user.id,
        session_id: request.session_id,
        kind: request.kind,
    };

    let result = state.verify_handler().handle(cmd).await?;

    Ok(Json(VerifyCheckoutResponse::from(result)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Cart & Access
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/cart
pub async fn get_cart(
    State(state): State<CheckoutAppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let result = GetCartHandler::new(state.carts.clone())
        .handle(GetCartQuery { user_id: user.id })
        .await?;
    Ok(Json(CartResponse::from(result)))
}

/// POST /api/cart
pub async fn add_to_cart(
    State(state): State<CheckoutAppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<AddToCartRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = AddToCartCommand {
        user_id: user.id,
        subject_id: request.subject_id,
        content_type_id: request.content_type_id,
        is_bundle: request.is_bundle,
    };

    let item = AddToCartHandler::new(
        state.carts.clone(),
        state.access.clone(),
        state.catalog.clone(),
    )
    .handle(cmd)
    .await?;

    Ok((StatusCode::CREATED, Json(CartItemResponse::from(item))))
}

/// DELETE /api/cart/:id
pub async fn remove_from_cart(
    State(state): State<CheckoutAppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let cart_item_id: CartItemId = id
        .parse()
        .map_err(|_| CheckoutError::Validation(format!("Invalid cart item id: {}", id)))?;

    RemoveFromCartHandler::new(state.carts.clone())
        .handle(RemoveFromCartCommand {
            user_id: user.id,
            cart_item_id,
        })
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/access
pub async fn list_access(
    State(state): State<CheckoutAppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let rows = ListAccessHandler::new(state.access.clone())
        .handle(ListAccessQuery { user_id: user.id })
        .await?;
    Ok(Json(
        rows.into_iter().map(AccessResponse::from).collect::<Vec<_>>(),
    ))
}

// ════════════════════════════════════════════════════════════════════════════════
// Webhooks
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/webhooks/stripe - Handle Stripe webhook events
///
/// The raw body is required for signature verification.
pub async fn handle_stripe_webhook(
    State(state): State<CheckoutAppState>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Result<impl IntoResponse, WebhookApiError> {
    let signature = headers
        .get("Stripe-Signature")
        .and_then(|v| v.to_str().ok())
        .ok_or(WebhookError::MissingSignature)?;

    let cmd = HandlePaymentWebhookCommand {
        payload: body.to_vec(),
        signature: signature.to_string(),
    };

    let result = state.webhook_handler().handle(cmd).await?;
    tracing::debug!(result = ?result, "Webhook acknowledged");

    Ok(Json(WebhookAck { received: true }))
}
