//! Booking port over the in-memory store.

use async_trait::async_trait;

use super::InMemoryStore;
use crate::domain::booking::SessionBooking;
use crate::domain::foundation::{BookingId, DomainError, ErrorCode, Money};
use crate::ports::BookingRepository;

#[async_trait]
impl BookingRepository for InMemoryStore {
    async fn insert(&self, booking: &SessionBooking) -> Result<(), DomainError> {
        self.check_writable()?;
        let mut state = self.state.write().await;
        if state.bookings.contains_key(&booking.id) {
            return Err(DomainError::new(ErrorCode::Conflict, "Booking already exists"));
        }
        state.bookings.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &BookingId) -> Result<Option<SessionBooking>, DomainError> {
        Ok(self.state.read().await.bookings.get(id).cloned())
    }

    async fn attach_checkout_session(
        &self,
        id: &BookingId,
        stripe_session_id: &str,
    ) -> Result<(), DomainError> {
        self.check_writable()?;
        let mut state = self.state.write().await;
        let booking = state
            .bookings
            .get_mut(id)
            .ok_or_else(|| DomainError::new(ErrorCode::BookingNotFound, "Booking not found"))?;
        booking.stripe_session_id = Some(stripe_session_id.to_string());
        Ok(())
    }

    async fn confirm_payment(
        &self,
        id: &BookingId,
        payment_intent_id: Option<&str>,
        amount_paid: Money,
    ) -> Result<bool, DomainError> {
        self.check_writable()?;
        let mut state = self.state.write().await;
        match state.bookings.get_mut(id) {
            Some(booking) => Ok(booking.confirm_payment(payment_intent_id.map(str::to_string), amount_paid)?),
            None => Ok(false),
        }
    }
}
