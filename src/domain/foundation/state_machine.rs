//! State machine trait for status enums.
//!
//! Purchases and bookings each have a small lifecycle; implementors list
//! their legal edges and get a checked `transition_to` for free.

use super::ValidationError;

/// Trait for status enums that represent state machines.
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug + 'static {
    /// Every state, in declaration order.
    const ALL: &'static [Self];

    /// Returns true if transition from self to target is valid.
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Performs transition with validation, returning error if invalid.
    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(ValidationError::invalid_format(
                "status",
                format!("Cannot transition from {:?} to {:?}", self, target),
            ))
        }
    }

    /// Returns all valid target states from the current state.
    fn valid_transitions(&self) -> Vec<Self> {
        Self::ALL
            .iter()
            .copied()
            .filter(|target| self.can_transition_to(target))
            .collect()
    }

    /// Checks if current state is terminal (no valid outgoing transitions).
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}
