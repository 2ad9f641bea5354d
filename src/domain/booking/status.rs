//! Booking status state machine.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::StateMachine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Created at checkout, awaiting payment.
    Pending,
    /// Paid; the session will happen.
    Confirmed,
    /// The session took place.
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(BookingStatus::Pending),
            "confirmed" => Some(BookingStatus::Confirmed),
            "completed" => Some(BookingStatus::Completed),
            "cancelled" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }
}

impl StateMachine for BookingStatus {
    const ALL: &'static [Self] = &[
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
    ];

    fn can_transition_to(&self, target: &Self) -> bool {
        use BookingStatus::*;
        matches!(
            (self, target),
            (Pending, Confirmed) | (Pending, Cancelled) | (Confirmed, Completed) | (Confirmed, Cancelled)
        )
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_confirms() {
        assert_eq!(
            BookingStatus::Pending.transition_to(BookingStatus::Confirmed),
            Ok(BookingStatus::Confirmed)
        );
    }

    #[test]
    fn confirmed_cannot_confirm_again() {
        assert!(BookingStatus::Confirmed
            .transition_to(BookingStatus::Confirmed)
            .is_err());
    }

    #[test]
    fn completed_and_cancelled_are_terminal() {
        assert!(BookingStatus::Completed.is_terminal());
        assert!(BookingStatus::Cancelled.is_terminal());
        assert!(!BookingStatus::Pending.is_terminal());
    }

    #[test]
    fn parse_round_trips() {
        for status in BookingStatus::ALL {
            assert_eq!(BookingStatus::parse(status.as_str()), Some(*status));
        }
    }
}
