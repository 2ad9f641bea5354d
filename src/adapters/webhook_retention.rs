//! WebhookRetention - Background sweep of old webhook dedup records.
//!
//! Handled events only need to outlive Stripe's redelivery window. The
//! sweep deletes records older than the retention period on a fixed
//! interval and once more on shutdown.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::time;

use crate::domain::foundation::DomainError;
use crate::ports::WebhookEventRepository;

#[derive(Debug, Clone)]
pub struct WebhookRetentionConfig {
    /// How long handled events are kept.
    pub retention: chrono::Duration,
    /// How often the sweep runs.
    pub interval: Duration,
}

impl Default for WebhookRetentionConfig {
    fn default() -> Self {
        Self {
            retention: chrono::Duration::days(30),
            interval: Duration::from_secs(3600),
        }
    }
}

pub struct WebhookRetention {
    events: Arc<dyn WebhookEventRepository>,
    config: WebhookRetentionConfig,
}

impl WebhookRetention {
    pub fn new(events: Arc<dyn WebhookEventRepository>, config: WebhookRetentionConfig) -> Self {
        Self { events, config }
    }

    /// Sweeps until the shutdown channel flips to `true`.
    ///
    /// A failed sweep is logged and retried on the next tick.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = time::interval(self.config.interval);

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        self.sweep_logged().await;
                        return;
                    }
                }
                _ = interval.tick() => {
                    self.sweep_logged().await;
                }
            }
        }
    }

    /// Deletes records older than the retention period; returns how many.
    pub async fn sweep_once(&self) -> Result<u64, DomainError> {
        let cutoff = Utc::now() - self.config.retention;
        let deleted = self.events.delete_before(cutoff).await?;
        if deleted > 0 {
            tracing::info!(deleted, %cutoff, "Old webhook events removed");
        }
        Ok(deleted)
    }

    async fn sweep_logged(&self) {
        if let Err(e) = self.sweep_once().await {
            tracing::warn!(error = %e, "Webhook retention sweep failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;
    use crate::ports::WebhookEventRecord;
    use serde_json::json;

    async fn store_with_old_and_new() -> InMemoryStore {
        let store = InMemoryStore::new();
        let mut old = WebhookEventRecord::success("evt_old", "checkout.session.completed", json!({}));
        old.processed_at = Utc::now() - chrono::Duration::days(45);
        store.save(old).await.unwrap();
        store
            .save(WebhookEventRecord::success("evt_new", "checkout.session.completed", json!({})))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn sweep_removes_only_expired_records() {
        let store = store_with_old_and_new().await;
        let retention = WebhookRetention::new(Arc::new(store.clone()), WebhookRetentionConfig::default());

        assert_eq!(retention.sweep_once().await.unwrap(), 1);
        assert_eq!(store.webhook_event_count().await, 1);
        assert!(store.find_by_event_id("evt_new").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn run_sweeps_and_stops_on_shutdown() {
        let store = store_with_old_and_new().await;
        let retention = WebhookRetention::new(
            Arc::new(store.clone()),
            WebhookRetentionConfig {
                interval: Duration::from_millis(10),
                ..WebhookRetentionConfig::default()
            },
        );
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(async move { retention.run(rx).await });
        tokio::time::sleep(Duration::from_millis(30)).await;
        tx.send(true).unwrap();
        handle.await.unwrap();

        assert_eq!(store.webhook_event_count().await, 1);
    }
}
