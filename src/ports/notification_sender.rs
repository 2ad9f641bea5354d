//! Notification port for transactional email.

use async_trait::async_trait;

use crate::domain::foundation::{BookingId, DomainError, Money, Timestamp};

/// Content of a booking confirmation email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingConfirmation {
    pub booking_id: BookingId,
    pub recipient: String,
    pub contact_name: Option<String>,
    pub session_type_name: String,
    pub duration_minutes: u32,
    pub amount_paid: Money,
    pub scheduled_at: Option<Timestamp>,
}

#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send_booking_confirmation(
        &self,
        confirmation: &BookingConfirmation,
    ) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_sender_is_object_safe() {
        fn _accepts_dyn(_sender: &dyn NotificationSender) {}
    }
}
