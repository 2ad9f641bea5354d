//! HTTP adapter for the storefront endpoints.
//!
//! - `POST /api/checkout` - Start a cart checkout
//! - `POST /api/checkout/booking` - Start a 1:1 session checkout
//! - `POST /api/checkout/verify` - Success-page fallback
//! - `GET|POST /api/cart`, `DELETE /api/cart/:id` - Cart management
//! - `GET /api/access` - Unlocked content
//! - `POST /api/webhooks/stripe` - Stripe webhooks

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::CheckoutAppState;
pub use routes::{api_routes, webhook_routes};
