//! Booking module - Paid 1:1 sessions, confirmed through the same
//! reconciliation path as course purchases.

mod aggregate;
mod status;

pub use aggregate::SessionBooking;
pub use status::BookingStatus;
