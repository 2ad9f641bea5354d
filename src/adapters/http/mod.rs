//! HTTP adapter - axum routes, middleware and error mapping.

pub mod checkout;
pub mod error;
pub mod middleware;
pub mod router;

pub use checkout::CheckoutAppState;
pub use error::{ApiError, ErrorResponse, WebhookApiError};
pub use router::{build_router, RouterConfig};
