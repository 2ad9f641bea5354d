//! Webhook processor - Routes verified events to handlers, at most once.
//!
//! 1. Skip if the event id is already recorded
//! 2. Dispatch to the handler registered for the event type
//! 3. Record successes and ignores; leave failures unrecorded so the
//!    provider's redelivery gets another attempt
//!
//! Two deliveries racing past step 1 both dispatch. That is safe because
//! every handler is idempotent on its own keys; the loser of the step 3
//! insert reports `AlreadyProcessed`.

use std::sync::Arc;

use async_trait::async_trait;

use super::{StripeEvent, StripeEventType, WebhookError};
use crate::ports::{SaveResult, WebhookEventRecord, WebhookEventRepository, WebhookResult};

/// Handler for one or more Stripe event types.
#[async_trait]
pub trait WebhookEventHandler: Send + Sync {
    /// Event types this handler processes.
    fn handles(&self) -> Vec<StripeEventType>;

    /// Returns `Err(WebhookError::Ignored(_))` to acknowledge without action.
    async fn handle(&self, event: &StripeEvent) -> Result<(), WebhookError>;
}

/// Routes events to handlers.
#[async_trait]
pub trait WebhookDispatcher: Send + Sync {
    fn get_handler(&self, event_type: &StripeEventType) -> Option<&dyn WebhookEventHandler>;

    /// Dispatches an event; unregistered types come back as `Ignored`.
    async fn dispatch(&self, event: &StripeEvent) -> Result<(), WebhookError> {
        let event_type = event.parsed_type();
        match self.get_handler(&event_type) {
            Some(handler) => handler.handle(event).await,
            None => Err(WebhookError::Ignored(format!(
                "No handler for event type: {}",
                event.event_type
            ))),
        }
    }
}

/// A dispatcher over a fixed list of handlers. First match wins.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: Vec<Arc<dyn WebhookEventHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, handler: Arc<dyn WebhookEventHandler>) -> Self {
        self.handlers.push(handler);
        self
    }
}

impl WebhookDispatcher for HandlerRegistry {
    fn get_handler(&self, event_type: &StripeEventType) -> Option<&dyn WebhookEventHandler> {
        if *event_type == StripeEventType::Unknown {
            return None;
        }
        self.handlers
            .iter()
            .find(|h| h.handles().contains(event_type))
            .map(|h| h.as_ref())
    }
}

/// Processes webhook events with idempotency guarantees.
pub struct IdempotentWebhookProcessor<D: WebhookDispatcher> {
    repository: Arc<dyn WebhookEventRepository>,
    dispatcher: D,
}

impl<D: WebhookDispatcher> IdempotentWebhookProcessor<D> {
    pub fn new(repository: Arc<dyn WebhookEventRepository>, dispatcher: D) -> Self {
        Self {
            repository,
            dispatcher,
        }
    }

    /// Processes a verified event.
    ///
    /// # Returns
    ///
    /// - `Ok(WebhookResult::Processed)` - handled or ignored on this delivery
    /// - `Ok(WebhookResult::AlreadyProcessed)` - an earlier delivery handled it
    /// - `Err(_)` - handler failed; nothing recorded
    pub async fn process(&self, event: &StripeEvent) -> Result<WebhookResult, WebhookError> {
        if self.repository.find_by_event_id(&event.id).await?.is_some() {
            tracing::debug!(event_id = %event.id, "Webhook event already processed");
            return Ok(WebhookResult::AlreadyProcessed);
        }

        let record = match self.dispatcher.dispatch(event).await {
            Ok(()) => WebhookEventRecord::success(&event.id, &event.event_type, payload_of(event)),
            Err(WebhookError::Ignored(reason)) => {
                tracing::info!(
                    event_id = %event.id,
                    event_type = %event.event_type,
                    reason = %reason,
                    "Webhook event ignored"
                );
                WebhookEventRecord::ignored(&event.id, &event.event_type, reason, payload_of(event))
            }
            Err(e) => return Err(e),
        };

        match self.repository.save(record).await? {
            SaveResult::Inserted => Ok(WebhookResult::Processed),
            SaveResult::AlreadyExists => Ok(WebhookResult::AlreadyProcessed),
        }
    }
}

fn payload_of(event: &StripeEvent) -> serde_json::Value {
    serde_json::to_value(event).unwrap_or(serde_json::Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::DomainError;
    use crate::domain::webhook::StripeEventBuilder;
    use crate::ports::WebhookDisposition;
    use chrono::{DateTime, Utc};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::sync::RwLock;

    // ══════════════════════════════════════════════════════════════
    // Test Infrastructure
    // ══════════════════════════════════════════════════════════════

    #[derive(Default)]
    struct MockWebhookRepository {
        records: RwLock<HashMap<String, WebhookEventRecord>>,
    }

    impl MockWebhookRepository {
        async fn get(&self, event_id: &str) -> Option<WebhookEventRecord> {
            self.records.read().await.get(event_id).cloned()
        }
    }

    #[async_trait]
    impl WebhookEventRepository for MockWebhookRepository {
        async fn find_by_event_id(
            &self,
            event_id: &str,
        ) -> Result<Option<WebhookEventRecord>, DomainError> {
            Ok(self.get(event_id).await)
        }

        async fn save(&self, record: WebhookEventRecord) -> Result<SaveResult, DomainError> {
            let mut records = self.records.write().await;
            if records.contains_key(&record.event_id) {
                Ok(SaveResult::AlreadyExists)
            } else {
                records.insert(record.event_id.clone(), record);
                Ok(SaveResult::Inserted)
            }
        }

        async fn delete_before(&self, timestamp: DateTime<Utc>) -> Result<u64, DomainError> {
            let mut records = self.records.write().await;
            let before = records.len();
            records.retain(|_, r| r.processed_at >= timestamp);
            Ok((before - records.len()) as u64)
        }
    }

    enum Behaviour {
        Succeed,
        Fail,
        Ignore,
    }

    struct MockHandler {
        behaviour: Behaviour,
        call_count: AtomicU32,
    }

    impl MockHandler {
        fn new(behaviour: Behaviour) -> Arc<Self> {
            Arc::new(Self {
                behaviour,
                call_count: AtomicU32::new(0),
            })
        }

        fn calls(&self) -> u32 {
            self.call_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl WebhookEventHandler for MockHandler {
        fn handles(&self) -> Vec<StripeEventType> {
            vec![StripeEventType::CheckoutSessionCompleted]
        }

        async fn handle(&self, _event: &StripeEvent) -> Result<(), WebhookError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            match self.behaviour {
                Behaviour::Succeed => Ok(()),
                Behaviour::Fail => Err(WebhookError::Database("connection reset".to_string())),
                Behaviour::Ignore => Err(WebhookError::Ignored("malformed session".to_string())),
            }
        }
    }

    fn processor(
        handler: Arc<MockHandler>,
    ) -> (Arc<MockWebhookRepository>, IdempotentWebhookProcessor<HandlerRegistry>) {
        let repo = Arc::new(MockWebhookRepository::default());
        let registry = HandlerRegistry::new().register(handler);
        (repo.clone(), IdempotentWebhookProcessor::new(repo, registry))
    }

    fn completed_event(id: &str) -> StripeEvent {
        StripeEventBuilder::new()
            .id(id)
            .event_type(StripeEventType::CheckoutSessionCompleted)
            .build()
    }

    // ══════════════════════════════════════════════════════════════
    // Dispatcher Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn registry_finds_handler_for_registered_type() {
        let registry = HandlerRegistry::new().register(MockHandler::new(Behaviour::Succeed));
        assert!(registry
            .get_handler(&StripeEventType::CheckoutSessionCompleted)
            .is_some());
        assert!(registry
            .get_handler(&StripeEventType::PaymentIntentSucceeded)
            .is_none());
    }

    #[tokio::test]
    async fn unknown_event_types_are_ignored() {
        let registry = HandlerRegistry::new().register(MockHandler::new(Behaviour::Succeed));
        let event = StripeEventBuilder::new().raw_type("customer.created").build();

        let result = registry.dispatch(&event).await;
        assert!(matches!(result, Err(WebhookError::Ignored(_))));
    }

    // ══════════════════════════════════════════════════════════════
    // Processor Tests
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn processes_new_event_and_records_success() {
        let handler = MockHandler::new(Behaviour::Succeed);
        let (repo, processor) = processor(handler.clone());

        let result = processor.process(&completed_event("evt_1")).await.unwrap();

        assert_eq!(result, WebhookResult::Processed);
        assert_eq!(handler.calls(), 1);
        let record = repo.get("evt_1").await.unwrap();
        assert_eq!(record.disposition, WebhookDisposition::Success);
    }

    #[tokio::test]
    async fn duplicate_delivery_skips_handler() {
        let handler = MockHandler::new(Behaviour::Succeed);
        let (_repo, processor) = processor(handler.clone());
        let event = completed_event("evt_dup");

        processor.process(&event).await.unwrap();
        let second = processor.process(&event).await.unwrap();

        assert_eq!(second, WebhookResult::AlreadyProcessed);
        assert_eq!(handler.calls(), 1);
    }

    #[tokio::test]
    async fn failure_is_not_recorded_so_redelivery_retries() {
        let handler = MockHandler::new(Behaviour::Fail);
        let (repo, processor) = processor(handler.clone());
        let event = completed_event("evt_fail");

        let first = processor.process(&event).await;
        assert!(matches!(first, Err(WebhookError::Database(_))));
        assert!(repo.get("evt_fail").await.is_none());

        let _ = processor.process(&event).await;
        assert_eq!(handler.calls(), 2);
    }

    #[tokio::test]
    async fn ignored_event_is_recorded_and_acknowledged() {
        let handler = MockHandler::new(Behaviour::Ignore);
        let (repo, processor) = processor(handler);

        let result = processor.process(&completed_event("evt_ign")).await.unwrap();

        assert_eq!(result, WebhookResult::Processed);
        let record = repo.get("evt_ign").await.unwrap();
        assert_eq!(record.disposition, WebhookDisposition::Ignored);
        assert_eq!(record.reason.as_deref(), Some("malformed session"));
    }

    #[tokio::test]
    async fn unhandled_type_is_recorded_as_ignored() {
        let handler = MockHandler::new(Behaviour::Succeed);
        let (repo, processor) = processor(handler.clone());
        let event = StripeEventBuilder::new()
            .id("evt_other")
            .raw_type("charge.refunded")
            .build();

        let result = processor.process(&event).await.unwrap();

        assert_eq!(result, WebhookResult::Processed);
        assert_eq!(handler.calls(), 0);
        assert!(repo.get("evt_other").await.is_some());
    }
}
