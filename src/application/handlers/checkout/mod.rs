//! Checkout handlers.
//!
//! ## Commands
//! - Creating a checkout session for the cart
//! - Creating a checkout session for a 1:1 booking
//! - Reconciling a completed session into purchases, access and bookings
//! - Marking purchases failed after a declined payment
//! - Processing payment webhooks
//! - Verifying a session from the success page

mod create_booking_checkout;
mod create_checkout_session;
mod fail_purchase;
mod handle_payment_webhook;
mod reconcile_checkout;
mod verify_checkout_session;

pub use create_booking_checkout::{
    CreateBookingCheckoutCommand, CreateBookingCheckoutHandler, CreateBookingCheckoutResult,
};
pub use create_checkout_session::{
    CreateCheckoutSessionCommand, CreateCheckoutSessionHandler, CreateCheckoutSessionResult,
};
pub use fail_purchase::{FailPurchaseCommand, FailPurchaseHandler};
pub use handle_payment_webhook::{HandlePaymentWebhookCommand, HandlePaymentWebhookHandler};
pub use reconcile_checkout::{ReconcileCheckoutHandler, ReconcileDeps, ReconcileOutcome};
pub use verify_checkout_session::{
    VerifyCheckoutSessionCommand, VerifyCheckoutSessionHandler, VerifyCheckoutSessionResult,
    STILL_PROCESSING_MESSAGE,
};
