//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Following CQRS, it separates command handlers (write) from query handlers (read).

pub mod handlers;

pub use handlers::access::{ListAccessHandler, ListAccessQuery};
pub use handlers::cart::{
    AddToCartCommand, AddToCartHandler, GetCartHandler, GetCartQuery, GetCartResult,
    RemoveFromCartCommand, RemoveFromCartHandler,
};
pub use handlers::checkout::{
    CreateBookingCheckoutCommand, CreateBookingCheckoutHandler, CreateBookingCheckoutResult,
    CreateCheckoutSessionCommand, CreateCheckoutSessionHandler, CreateCheckoutSessionResult,
    FailPurchaseCommand, FailPurchaseHandler, HandlePaymentWebhookCommand,
    HandlePaymentWebhookHandler, ReconcileCheckoutHandler, ReconcileDeps, ReconcileOutcome,
    VerifyCheckoutSessionCommand, VerifyCheckoutSessionHandler, VerifyCheckoutSessionResult,
};
