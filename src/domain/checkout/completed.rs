//! Provider-agnostic view of a completed checkout session.
//!
//! Both reconciliation triggers produce this: the webhook from the event
//! payload, the success-page fallback by asking the provider directly.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{CheckoutMetadata, MetadataError};
use crate::domain::foundation::Money;

/// Provider-reported payment state of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Paid,
    Unpaid,
    NoPaymentRequired,
    #[serde(other)]
    Unknown,
}

impl PaymentStatus {
    pub fn parse(s: &str) -> Self {
        match s {
            "paid" => PaymentStatus::Paid,
            "unpaid" => PaymentStatus::Unpaid,
            "no_payment_required" => PaymentStatus::NoPaymentRequired,
            _ => PaymentStatus::Unknown,
        }
    }

    /// True when the session may be materialized.
    pub fn is_settled(&self) -> bool {
        matches!(self, PaymentStatus::Paid | PaymentStatus::NoPaymentRequired)
    }
}

/// A checkout session as reported by the payment provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedCheckout {
    pub session_id: String,
    pub payment_intent_id: Option<String>,
    /// Total charged, in minor currency units.
    pub amount_total: Option<i64>,
    pub payment_status: PaymentStatus,
    pub customer_email: Option<String>,
    pub metadata: HashMap<String, String>,
}

impl CompletedCheckout {
    /// Parses the metadata envelope.
    pub fn envelope(&self) -> Result<CheckoutMetadata, MetadataError> {
        CheckoutMetadata::from_provider_metadata(&self.metadata)
    }

    /// Amount paid, assuming a two-decimal currency.
    pub fn amount_paid(&self) -> Option<Money> {
        self.amount_total.map(Money::from_minor_units)
    }
}
