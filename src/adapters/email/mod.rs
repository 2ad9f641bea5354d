//! Email adapters.
//!
//! - `ResendNotificationSender` - Resend HTTP API
//! - `RecordingNotificationSender` - Captures messages for tests

mod mock;
mod resend;

pub use mock::RecordingNotificationSender;
pub use resend::{render_booking_confirmation, ResendConfig, ResendNotificationSender};
