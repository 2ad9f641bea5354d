//! Purchase status.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::StateMachine;

/// Payment outcome recorded on a purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseStatus {
    Paid,
    Failed,
}

impl PurchaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseStatus::Paid => "paid",
            PurchaseStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "paid" => Some(PurchaseStatus::Paid),
            "failed" => Some(PurchaseStatus::Failed),
            _ => None,
        }
    }
}

impl StateMachine for PurchaseStatus {
    const ALL: &'static [Self] = &[PurchaseStatus::Paid, PurchaseStatus::Failed];

    fn can_transition_to(&self, target: &Self) -> bool {
        // A payment intent can fail after the session reported paid
        // (late decline, dispute). Nothing moves a failed purchase back.
        matches!((self, target), (PurchaseStatus::Paid, PurchaseStatus::Failed))
    }
}

impl std::fmt::Display for PurchaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
