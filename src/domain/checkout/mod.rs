//! Checkout module - What travels through the payment provider and back.
//!
//! The provider's session metadata is the only channel between checkout
//! creation and reconciliation, so it is modelled as a typed envelope
//! rather than ad hoc string keys.

mod completed;
mod errors;
mod kind;
mod line_item;
mod metadata;

pub use completed::{CompletedCheckout, PaymentStatus};
pub use errors::CheckoutError;
pub use kind::{CheckoutKind, SESSION_ID_PLACEHOLDER};
pub use line_item::{line_item_description, line_item_name, CheckoutLineItem};
pub use metadata::{
    AppliedOffer, BookingCheckout, CartCheckout, CheckoutMetadata, MetadataError,
    MAX_CHECKOUT_ITEMS, MAX_METADATA_VALUE_LEN, METADATA_VERSION,
};
