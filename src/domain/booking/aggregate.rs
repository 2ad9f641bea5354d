//! SessionBooking entity.

use serde::{Deserialize, Serialize};

use super::BookingStatus;
use crate::domain::foundation::{
    BookingId, Money, SessionTypeId, StateMachine, Timestamp, UserId, ValidationError,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionBooking {
    pub id: BookingId,
    /// Guests may book without an account.
    pub user_id: Option<UserId>,
    pub session_type_id: SessionTypeId,
    pub status: BookingStatus,
    pub stripe_session_id: Option<String>,
    pub stripe_payment_intent_id: Option<String>,
    pub amount_paid: Option<Money>,
    pub contact_email: String,
    pub contact_name: Option<String>,
    pub scheduled_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl SessionBooking {
    /// A new booking awaiting payment.
    pub fn pending(
        user_id: Option<UserId>,
        session_type_id: SessionTypeId,
        contact_email: impl Into<String>,
        contact_name: Option<String>,
        scheduled_at: Option<Timestamp>,
    ) -> Result<Self, ValidationError> {
        let contact_email = contact_email.into();
        if contact_email.trim().is_empty() {
            return Err(ValidationError::empty_field("contact_email"));
        }
        if !contact_email.contains('@') {
            return Err(ValidationError::invalid_format("contact_email", "missing '@'"));
        }

        Ok(Self {
            id: BookingId::new(),
            user_id,
            session_type_id,
            status: BookingStatus::Pending,
            stripe_session_id: None,
            stripe_payment_intent_id: None,
            amount_paid: None,
            contact_email,
            contact_name,
            scheduled_at,
            created_at: Timestamp::now(),
        })
    }

    /// True once reconciliation has confirmed and priced the booking.
    pub fn is_payment_recorded(&self) -> bool {
        self.status == BookingStatus::Confirmed && self.amount_paid.is_some()
    }

    /// Records payment and confirms.
    ///
    /// Returns `Ok(false)` without touching anything when payment was
    /// already recorded.
    pub fn confirm_payment(
        &mut self,
        payment_intent_id: Option<String>,
        amount_paid: Money,
    ) -> Result<bool, ValidationError> {
        if self.is_payment_recorded() {
            return Ok(false);
        }
        if self.status != BookingStatus::Confirmed {
            self.status = self.status.transition_to(BookingStatus::Confirmed)?;
        }
        self.stripe_payment_intent_id = payment_intent_id;
        self.amount_paid = Some(amount_paid);
        Ok(true)
    }
}
