//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, and error types
//! that form the vocabulary of the checkout domain.

mod auth;
mod errors;
mod ids;
mod money;
mod state_machine;
mod timestamp;

pub use auth::{AuthError, AuthenticatedUser};
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{
    BookingId, CartItemId, ContentTypeId, OfferId, PurchaseId, SessionTypeId, SubjectId, UserId,
};
pub use money::{round_cents, Money, MONEY_SCALE};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
