//! WebhookEventRepository port - Which provider events have been handled.
//!
//! Stripe delivers at least once: on timeouts, on any non-2xx response,
//! and occasionally for no reason at all. Recording handled event ids lets
//! a redelivery short-circuit before touching the ledger.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::foundation::DomainError;

/// How a recorded event was disposed of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookDisposition {
    /// A handler ran to completion.
    Success,
    /// Acknowledged without action (unknown type, malformed session...).
    Ignored,
}

impl WebhookDisposition {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookDisposition::Success => "success",
            WebhookDisposition::Ignored => "ignored",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "success" => Some(WebhookDisposition::Success),
            "ignored" => Some(WebhookDisposition::Ignored),
            _ => None,
        }
    }
}

/// Record of a handled webhook event.
#[derive(Debug, Clone)]
pub struct WebhookEventRecord {
    /// Stripe event ID (`evt_...`).
    pub event_id: String,

    /// Type of Stripe event (e.g., "checkout.session.completed").
    pub event_type: String,

    pub processed_at: DateTime<Utc>,

    pub disposition: WebhookDisposition,

    /// Why the event was ignored.
    pub reason: Option<String>,

    /// Original event payload, kept for support investigations.
    pub payload: serde_json::Value,
}

impl WebhookEventRecord {
    pub fn success(
        event_id: impl Into<String>,
        event_type: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            event_type: event_type.into(),
            processed_at: Utc::now(),
            disposition: WebhookDisposition::Success,
            reason: None,
            payload,
        }
    }

    pub fn ignored(
        event_id: impl Into<String>,
        event_type: impl Into<String>,
        reason: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            event_type: event_type.into(),
            processed_at: Utc::now(),
            disposition: WebhookDisposition::Ignored,
            reason: Some(reason.into()),
            payload,
        }
    }
}

/// Result of attempting to save a webhook event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveResult {
    /// First time seeing this event.
    Inserted,
    /// Another delivery recorded it first.
    AlreadyExists,
}

/// Port for storing and retrieving handled webhook events.
///
/// Implementations must enforce uniqueness on `event_id` so concurrent
/// deliveries resolve to a single `Inserted`.
#[async_trait]
pub trait WebhookEventRepository: Send + Sync {
    async fn find_by_event_id(
        &self,
        event_id: &str,
    ) -> Result<Option<WebhookEventRecord>, DomainError>;

    /// Saves with `ON CONFLICT DO NOTHING` semantics.
    async fn save(&self, record: WebhookEventRecord) -> Result<SaveResult, DomainError>;

    /// Deletes records processed before `timestamp`; returns how many.
    async fn delete_before(&self, timestamp: DateTime<Utc>) -> Result<u64, DomainError>;
}

/// Result of webhook processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookResult {
    /// Event was handled (or deliberately ignored) on this delivery.
    Processed,
    /// Event was handled by an earlier delivery.
    AlreadyProcessed,
}
