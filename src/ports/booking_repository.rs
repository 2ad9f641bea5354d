//! Session booking repository port.

use async_trait::async_trait;

use crate::domain::booking::SessionBooking;
use crate::domain::foundation::{BookingId, DomainError, Money};

#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn insert(&self, booking: &SessionBooking) -> Result<(), DomainError>;

    async fn find_by_id(&self, id: &BookingId) -> Result<Option<SessionBooking>, DomainError>;

    /// Stores the provider session id once the checkout session exists.
    async fn attach_checkout_session(
        &self,
        id: &BookingId,
        stripe_session_id: &str,
    ) -> Result<(), DomainError>;

    /// Confirms the booking and records the payment.
    ///
    /// Conditional on payment not already being recorded
    /// (`NOT (status = 'confirmed' AND amount_paid IS NOT NULL)`). Returns
    /// `false` when the condition did not hold, i.e. another run confirmed it.
    async fn confirm_payment(
        &self,
        id: &BookingId,
        payment_intent_id: Option<&str>,
        amount_paid: Money,
    ) -> Result<bool, DomainError>;
}
