//! VerifyCheckoutSessionHandler - Success-page fallback for a slow webhook.
//!
//! The shopper lands on the success page with the provider's session id.
//! If the webhook has not arrived yet, this pulls the session from the
//! provider and runs the same reconciliation the webhook would.

use std::sync::Arc;

use super::{ReconcileCheckoutHandler, ReconcileOutcome};
use crate::domain::checkout::{CheckoutError, CheckoutKind};
use crate::domain::foundation::UserId;
use crate::ports::PaymentProvider;

/// Shown whenever the fallback cannot finish; the webhook will.
pub const STILL_PROCESSING_MESSAGE: &str =
    "Payment is still processing. Your access will appear shortly.";

#[derive(Debug, Clone)]
pub struct VerifyCheckoutSessionCommand {
    pub user_id: UserId,
    pub session_id: String,
    pub kind: CheckoutKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyCheckoutSessionResult {
    pub success: bool,
    pub message: Option<String>,
    pub already_processed: Option<bool>,
}

impl VerifyCheckoutSessionResult {
    fn done(kind: CheckoutKind, already_processed: bool) -> Self {
        let message = match kind {
            CheckoutKind::Course => "Purchase complete",
            CheckoutKind::Session => "Booking confirmed",
        };
        Self {
            success: true,
            message: Some(message.to_string()),
            already_processed: Some(already_processed),
        }
    }

    fn still_processing() -> Self {
        Self {
            success: false,
            message: Some(STILL_PROCESSING_MESSAGE.to_string()),
            already_processed: None,
        }
    }
}

pub struct VerifyCheckoutSessionHandler {
    payment_provider: Arc<dyn PaymentProvider>,
    reconciler: Arc<ReconcileCheckoutHandler>,
}

impl VerifyCheckoutSessionHandler {
    pub fn new(
        payment_provider: Arc<dyn PaymentProvider>,
        reconciler: Arc<ReconcileCheckoutHandler>,
    ) -> Self {
        Self {
            payment_provider,
            reconciler,
        }
    }

    /// Only `Unauthorized` and `Validation` surface as errors; every other
    /// failure becomes a "still processing" result.
    pub async fn handle(
        &self,
        cmd: VerifyCheckoutSessionCommand,
    ) -> Result<VerifyCheckoutSessionResult, CheckoutError> {
        if cmd.session_id.trim().is_empty() {
            return Err(CheckoutError::Validation("session_id cannot be empty".to_string()));
        }

        let session = match self
            .payment_provider
            .retrieve_checkout_session(&cmd.session_id)
            .await
        {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(session_id = %cmd.session_id, error = %e, "Could not retrieve checkout session");
                return Ok(VerifyCheckoutSessionResult::still_processing());
            }
        };

        if let Ok(envelope) = session.envelope() {
            if let Some(owner) = envelope.user_id() {
                if owner != &cmd.user_id {
                    tracing::warn!(
                        session_id = %cmd.session_id,
                        caller = %cmd.user_id,
                        "Checkout session belongs to another user"
                    );
                    return Err(CheckoutError::Unauthorized(
                        "Checkout session belongs to another user".to_string(),
                    ));
                }
            }
        }

        match self.reconciler.handle(&session).await {
            Ok(ReconcileOutcome::AlreadyProcessed) => {
                Ok(VerifyCheckoutSessionResult::done(cmd.kind, true))
            }
            Ok(_) => Ok(VerifyCheckoutSessionResult::done(cmd.kind, false)),
            Err(e) => {
                tracing::info!(session_id = %cmd.session_id, error = %e, "Fallback reconciliation deferred");
                Ok(VerifyCheckoutSessionResult::still_processing())
            }
        }
    }
}
