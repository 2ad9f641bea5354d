//! Axum router configuration for the storefront endpoints.

use axum::{
    routing::{delete, get, post},
    Router,
};

use super::handlers::{
    add_to_cart, create_booking_checkout, create_checkout, get_cart, handle_stripe_webhook,
    list_access, remove_from_cart, verify_checkout, CheckoutAppState,
};

/// Authenticated API routes, mounted under `/api`.
///
/// - `POST /checkout` - Checkout session for the cart
/// - `POST /checkout/booking` - Checkout session for a 1:1 booking
/// - `POST /checkout/verify` - Success-page verification
/// - `GET /cart`, `POST /cart`, `DELETE /cart/:id`
/// - `GET /access`
pub fn api_routes() -> Router<CheckoutAppState> {
    Router::new()
        .route("/checkout", post(create_checkout))
        .route("/checkout/booking", post(create_booking_checkout))
        .route("/checkout/verify", post(verify_checkout))
        .route("/cart", get(get_cart).post(add_to_cart))
        .route("/cart/:id", delete(remove_from_cart))
        .route("/access", get(list_access))
}

/// Webhook routes, mounted under `/api/webhooks`.
///
/// Kept apart from `api_routes` because webhooks carry no user token and
/// are exempt from rate limiting (the provider retries on its own).
pub fn webhook_routes() -> Router<CheckoutAppState> {
    Router::new().route("/stripe", post(handle_stripe_webhook))
}
