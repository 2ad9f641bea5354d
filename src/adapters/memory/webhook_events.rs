//! Webhook event deduplication over the in-memory store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::InMemoryStore;
use crate::domain::foundation::DomainError;
use crate::ports::{SaveResult, WebhookEventRecord, WebhookEventRepository};

#[async_trait]
impl WebhookEventRepository for InMemoryStore {
    async fn find_by_event_id(
        &self,
        event_id: &str,
    ) -> Result<Option<WebhookEventRecord>, DomainError> {
        Ok(self.state.read().await.webhook_events.get(event_id).cloned())
    }

    async fn save(&self, record: WebhookEventRecord) -> Result<SaveResult, DomainError> {
        let mut state = self.state.write().await;
        if state.webhook_events.contains_key(&record.event_id) {
            return Ok(SaveResult::AlreadyExists);
        }
        state.webhook_events.insert(record.event_id.clone(), record);
        Ok(SaveResult::Inserted)
    }

    async fn delete_before(&self, timestamp: DateTime<Utc>) -> Result<u64, DomainError> {
        let mut state = self.state.write().await;
        let before = state.webhook_events.len();
        state.webhook_events.retain(|_, r| r.processed_at >= timestamp);
        Ok((before - state.webhook_events.len()) as u64)
    }
}
