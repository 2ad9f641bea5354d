//! PostgreSQL implementation of WebhookEventRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::db_error;
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::{SaveResult, WebhookDisposition, WebhookEventRecord, WebhookEventRepository};

pub struct PostgresWebhookEventRepository {
    pool: PgPool,
}

impl PostgresWebhookEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct WebhookEventRow {
    event_id: String,
    event_type: String,
    processed_at: DateTime<Utc>,
    disposition: String,
    reason: Option<String>,
    payload: serde_json::Value,
}

impl TryFrom<WebhookEventRow> for WebhookEventRecord {
    type Error = DomainError;

    fn try_from(row: WebhookEventRow) -> Result<Self, Self::Error> {
        let disposition = WebhookDisposition::parse(&row.disposition).ok_or_else(|| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Invalid webhook disposition: {}", row.disposition),
            )
        })?;

        Ok(WebhookEventRecord {
            event_id: row.event_id,
            event_type: row.event_type,
            processed_at: row.processed_at,
            disposition,
            reason: row.reason,
            payload: row.payload,
        })
    }
}

#[async_trait]
impl WebhookEventRepository for PostgresWebhookEventRepository {
    async fn find_by_event_id(
        &self,
        event_id: &str,
    ) -> Result<Option<WebhookEventRecord>, DomainError> {
        let row: Option<WebhookEventRow> = sqlx::query_as(
            r#"
            SELECT event_id, event_type, processed_at, disposition, reason, payload
            FROM webhook_events
            WHERE event_id = $1
            "#,
        )
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to find webhook event"))?;

        row.map(WebhookEventRecord::try_from).transpose()
    }

    async fn save(&self, record: WebhookEventRecord) -> Result<SaveResult, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO webhook_events (event_id, event_type, processed_at, disposition, reason, payload)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (event_id) DO NOTHING
            "#,
        )
        .bind(&record.event_id)
        .bind(&record.event_type)
        .bind(record.processed_at)
        .bind(record.disposition.as_str())
        .bind(&record.reason)
        .bind(&record.payload)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to save webhook event"))?;

        if result.rows_affected() == 0 {
            Ok(SaveResult::AlreadyExists)
        } else {
            Ok(SaveResult::Inserted)
        }
    }

    async fn delete_before(&self, timestamp: DateTime<Utc>) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM webhook_events WHERE processed_at < $1")
            .bind(timestamp)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to prune webhook events"))?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_with_unknown_disposition_is_rejected() {
        let row = WebhookEventRow {
            event_id: "evt_1".to_string(),
            event_type: "checkout.session.completed".to_string(),
            processed_at: Utc::now(),
            disposition: "maybe".to_string(),
            reason: None,
            payload: serde_json::json!({}),
        };
        assert!(WebhookEventRecord::try_from(row).is_err());
    }
}
