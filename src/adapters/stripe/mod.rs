//! Stripe adapters.
//!
//! - `StripePaymentAdapter` - REST client for hosted checkout sessions
//! - `MockPaymentProvider` - In-process provider for tests and local runs

mod api_types;
mod mock_payment_provider;
mod stripe_adapter;

pub use mock_payment_provider::MockPaymentProvider;
pub use stripe_adapter::{StripeConfig, StripePaymentAdapter};
