//! Webhook module - Verifying and processing payment provider callbacks.
//!
//! Stripe signs every delivery; nothing is parsed before the signature
//! checks out. Deliveries are at-least-once, so processing is keyed on the
//! event id and the downstream reconciliation is itself idempotent.

mod errors;
mod processor;
mod stripe_event;
mod verifier;

pub use errors::WebhookError;
pub use processor::{
    HandlerRegistry, IdempotentWebhookProcessor, WebhookDispatcher, WebhookEventHandler,
};
pub use stripe_event::{
    StripeCheckoutSessionObject, StripeCustomerDetails, StripeEvent, StripeEventData,
    StripeEventType, StripePaymentError, StripePaymentIntentObject,
};
pub use verifier::{signature_header, SignatureHeader, StripeWebhookVerifier};

#[cfg(test)]
pub use stripe_event::StripeEventBuilder;
