//! Recording notification sender for tests.

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::{BookingConfirmation, NotificationSender};

/// Keeps every confirmation instead of sending it.
#[derive(Default)]
pub struct RecordingNotificationSender {
    sent: Mutex<Vec<BookingConfirmation>>,
    fail: Mutex<bool>,
}

impl RecordingNotificationSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sender whose every call fails.
    pub fn failing() -> Self {
        let sender = Self::default();
        *sender.fail.lock().unwrap_or_else(PoisonError::into_inner) = true;
        sender
    }

    fn sent_guard(&self) -> MutexGuard<'_, Vec<BookingConfirmation>> {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn sent(&self) -> Vec<BookingConfirmation> {
        self.sent_guard().clone()
    }
}

#[async_trait]
impl NotificationSender for RecordingNotificationSender {
    async fn send_booking_confirmation(
        &self,
        confirmation: &BookingConfirmation,
    ) -> Result<(), DomainError> {
        if *self.fail.lock().unwrap_or_else(PoisonError::into_inner) {
            return Err(DomainError::new(
                ErrorCode::NotificationError,
                "Simulated email failure",
            ));
        }
        self.sent_guard().push(confirmation.clone());
        Ok(())
    }
}
