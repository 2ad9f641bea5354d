//! FailPurchaseHandler - Marks purchases failed after a declined payment.

use std::sync::Arc;

use crate::domain::checkout::CheckoutError;
use crate::ports::PurchaseRepository;

#[derive(Debug, Clone)]
pub struct FailPurchaseCommand {
    pub payment_intent_id: String,
    /// Provider's decline reason, logged only.
    pub reason: Option<String>,
}

/// Marks every purchase carrying the payment intent as failed.
///
/// Access rows are left alone.
pub struct FailPurchaseHandler {
    purchases: Arc<dyn PurchaseRepository>,
}

impl FailPurchaseHandler {
    pub fn new(purchases: Arc<dyn PurchaseRepository>) -> Self {
        Self { purchases }
    }

    /// Returns the number of purchases updated.
    pub async fn handle(&self, cmd: FailPurchaseCommand) -> Result<u64, CheckoutError> {
        if cmd.payment_intent_id.trim().is_empty() {
            return Err(CheckoutError::Validation(
                "payment_intent_id cannot be empty".to_string(),
            ));
        }

        let updated = self
            .purchases
            .mark_failed_by_payment_intent(&cmd.payment_intent_id)
            .await?;

        tracing::info!(
            payment_intent_id = %cmd.payment_intent_id,
            reason = cmd.reason.as_deref().unwrap_or("unknown"),
            updated,
            "Payment failed; purchases marked"
        );

        Ok(updated)
    }
}
