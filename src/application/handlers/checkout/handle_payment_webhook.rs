//! HandlePaymentWebhookHandler - Entry point for Stripe webhook deliveries.
//!
//! Verifies the signature over the raw body before anything else, then
//! hands the event to the idempotent processor. Handlers for the three
//! event types we care about live here too.

use std::sync::Arc;

use async_trait::async_trait;

use super::{FailPurchaseCommand, FailPurchaseHandler, ReconcileCheckoutHandler, ReconcileOutcome};
use crate::domain::checkout::{CheckoutError, CompletedCheckout};
use crate::domain::webhook::{
    HandlerRegistry, IdempotentWebhookProcessor, StripeCheckoutSessionObject, StripeEvent,
    StripeEventType, StripePaymentIntentObject, StripeWebhookVerifier, WebhookError,
    WebhookEventHandler,
};
use crate::ports::{WebhookEventRepository, WebhookResult};

/// Command to handle a payment webhook.
#[derive(Debug, Clone)]
pub struct HandlePaymentWebhookCommand {
    /// Raw request body, exactly as received.
    pub payload: Vec<u8>,
    /// `Stripe-Signature` header value.
    pub signature: String,
}

pub struct HandlePaymentWebhookHandler {
    verifier: StripeWebhookVerifier,
    processor: IdempotentWebhookProcessor<HandlerRegistry>,
}

impl HandlePaymentWebhookHandler {
    pub fn new(
        verifier: StripeWebhookVerifier,
        events: Arc<dyn WebhookEventRepository>,
        reconciler: Arc<ReconcileCheckoutHandler>,
        fail_purchase: Arc<FailPurchaseHandler>,
    ) -> Self {
        let registry = HandlerRegistry::new()
            .register(Arc::new(CheckoutCompletedHandler { reconciler }))
            .register(Arc::new(PaymentSucceededHandler))
            .register(Arc::new(PaymentFailedHandler { fail_purchase }));

        Self {
            verifier,
            processor: IdempotentWebhookProcessor::new(events, registry),
        }
    }

    pub async fn handle(&self, cmd: HandlePaymentWebhookCommand) -> Result<WebhookResult, WebhookError> {
        let event = self
            .verifier
            .verify_and_parse(&cmd.payload, &cmd.signature)
            .map_err(|e| {
                tracing::warn!(error = %e, "Rejected webhook delivery");
                e
            })?;

        tracing::debug!(event_id = %event.id, event_type = %event.event_type, "Webhook verified");

        let result = self.processor.process(&event).await;
        if let Err(e) = &result {
            tracing::error!(
                event_id = %event.id,
                event_type = %event.event_type,
                error = %e,
                retryable = e.is_retryable(),
                "Webhook processing failed"
            );
        }
        result
    }
}

/// Maps reconciliation failures onto webhook semantics.
///
/// Sessions that can never succeed are acknowledged as ignored so the
/// provider stops redelivering them.
fn to_webhook_error(err: CheckoutError) -> WebhookError {
    match err {
        CheckoutError::MalformedSession(reason) => WebhookError::Ignored(reason),
        CheckoutError::NotPaid => WebhookError::Ignored("session not paid".to_string()),
        CheckoutError::Validation(reason) => WebhookError::Ignored(reason),
        CheckoutError::NotFound(what) => WebhookError::NotFound(what),
        CheckoutError::External(msg) | CheckoutError::CheckoutCreation(msg) => {
            WebhookError::External(msg)
        }
        other => WebhookError::Database(other.to_string()),
    }
}

struct CheckoutCompletedHandler {
    reconciler: Arc<ReconcileCheckoutHandler>,
}

#[async_trait]
impl WebhookEventHandler for CheckoutCompletedHandler {
    fn handles(&self) -> Vec<StripeEventType> {
        vec![
            StripeEventType::CheckoutSessionCompleted,
            StripeEventType::CheckoutSessionAsyncPaymentSucceeded,
        ]
    }

    async fn handle(&self, event: &StripeEvent) -> Result<(), WebhookError> {
        let object: StripeCheckoutSessionObject = event
            .deserialize_object()
            .map_err(|e| WebhookError::Ignored(format!("unreadable checkout session: {}", e)))?;
        let session = CompletedCheckout::from(object);

        match self.reconciler.handle(&session).await.map_err(to_webhook_error)? {
            ReconcileOutcome::AlreadyProcessed => {
                tracing::debug!(session_id = %session.session_id, "Checkout already reconciled");
            }
            ReconcileOutcome::Purchased { purchases, .. } => {
                tracing::debug!(session_id = %session.session_id, count = purchases.len(), "Checkout purchases written");
            }
            ReconcileOutcome::BookingConfirmed { booking_id } => {
                tracing::debug!(session_id = %session.session_id, %booking_id, "Checkout booking confirmed");
            }
        }
        Ok(())
    }
}

/// Fulfilment keys off the checkout session, so this only logs.
struct PaymentSucceededHandler;

#[async_trait]
impl WebhookEventHandler for PaymentSucceededHandler {
    fn handles(&self) -> Vec<StripeEventType> {
        vec![StripeEventType::PaymentIntentSucceeded]
    }

    async fn handle(&self, event: &StripeEvent) -> Result<(), WebhookError> {
        let intent: StripePaymentIntentObject = event
            .deserialize_object()
            .map_err(|e| WebhookError::Ignored(format!("unreadable payment intent: {}", e)))?;
        tracing::info!(payment_intent_id = %intent.id, amount = ?intent.amount, "Payment intent succeeded");
        Ok(())
    }
}

struct PaymentFailedHandler {
    fail_purchase: Arc<FailPurchaseHandler>,
}

#[async_trait]
impl WebhookEventHandler for PaymentFailedHandler {
    fn handles(&self) -> Vec<StripeEventType> {
        vec![StripeEventType::PaymentIntentPaymentFailed]
    }

    async fn handle(&self, event: &StripeEvent) -> Result<(), WebhookError> {
        let intent: StripePaymentIntentObject = event
            .deserialize_object()
            .map_err(|e| WebhookError::Ignored(format!("unreadable payment intent: {}", e)))?;

        self.fail_purchase
            .handle(FailPurchaseCommand {
                reason: intent.failure_reason().map(str::to_string),
                payment_intent_id: intent.id,
            })
            .await
            .map_err(to_webhook_error)?;
        Ok(())
    }
}
