//! Stripe webhook event types.
//!
//! Only the fields reconciliation reads are captured; everything else in
//! Stripe's schema is ignored on deserialization.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::checkout::{CompletedCheckout, PaymentStatus};

/// Stripe webhook event envelope.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEvent {
    /// Unique identifier for the event (`evt_...`).
    pub id: String,

    /// Type of event (e.g., "checkout.session.completed").
    #[serde(rename = "type")]
    pub event_type: String,

    /// Time at which the event was created (Unix timestamp).
    pub created: i64,

    /// Object containing event-specific data.
    pub data: StripeEventData,

    #[serde(default)]
    pub livemode: bool,

    /// API version used to render this event. Absent on some test fixtures.
    #[serde(default)]
    pub api_version: Option<String>,
}

/// Container for event-specific data.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEventData {
    /// The object that triggered the event (shape depends on event type).
    pub object: serde_json::Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_attributes: Option<serde_json::Value>,
}

impl StripeEvent {
    /// Attempts to deserialize the data object as the specified type.
    pub fn deserialize_object<T: serde::de::DeserializeOwned>(
        &self,
    ) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.data.object.clone())
    }

    /// Parse the event type into a known enum variant.
    pub fn parsed_type(&self) -> StripeEventType {
        StripeEventType::parse(&self.event_type)
    }
}

/// Stripe event types this service reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StripeEventType {
    /// Customer finished the hosted checkout page.
    CheckoutSessionCompleted,
    /// A delayed payment method (bank debit) settled after completion.
    CheckoutSessionAsyncPaymentSucceeded,
    /// Charge settled. Informational only.
    PaymentIntentSucceeded,
    /// Charge failed after the session completed.
    PaymentIntentPaymentFailed,
    /// Anything else; acknowledged and ignored.
    Unknown,
}

impl StripeEventType {
    pub fn parse(s: &str) -> Self {
        match s {
            "checkout.session.completed" => Self::CheckoutSessionCompleted,
            "checkout.session.async_payment_succeeded" => Self::CheckoutSessionAsyncPaymentSucceeded,
            "payment_intent.succeeded" => Self::PaymentIntentSucceeded,
            "payment_intent.payment_failed" => Self::PaymentIntentPaymentFailed,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CheckoutSessionCompleted => "checkout.session.completed",
            Self::CheckoutSessionAsyncPaymentSucceeded => "checkout.session.async_payment_succeeded",
            Self::PaymentIntentSucceeded => "payment_intent.succeeded",
            Self::PaymentIntentPaymentFailed => "payment_intent.payment_failed",
            Self::Unknown => "unknown",
        }
    }
}

/// Checkout session object, as found in `checkout.session.completed` events
/// and in `GET /v1/checkout/sessions/{id}` responses.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeCheckoutSessionObject {
    pub id: String,

    /// Unexpanded payment intent id. Null for free sessions.
    #[serde(default)]
    pub payment_intent: Option<String>,

    /// Total in minor units.
    #[serde(default)]
    pub amount_total: Option<i64>,

    #[serde(default)]
    pub payment_status: Option<String>,

    #[serde(default)]
    pub customer_email: Option<String>,

    #[serde(default)]
    pub customer_details: Option<StripeCustomerDetails>,

    #[serde(default)]
    pub metadata: HashMap<String, String>,

    /// Hosted page URL. Only present while the session is open.
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeCustomerDetails {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl From<StripeCheckoutSessionObject> for CompletedCheckout {
    fn from(session: StripeCheckoutSessionObject) -> Self {
        let customer_email = session
            .customer_email
            .or_else(|| session.customer_details.and_then(|d| d.email));

        CompletedCheckout {
            session_id: session.id,
            payment_intent_id: session.payment_intent,
            amount_total: session.amount_total,
            payment_status: session
                .payment_status
                .as_deref()
                .map(PaymentStatus::parse)
                .unwrap_or(PaymentStatus::Unknown),
            customer_email,
            metadata: session.metadata,
        }
    }
}

/// Payment intent object, as found in `payment_intent.*` events.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripePaymentIntentObject {
    pub id: String,

    #[serde(default)]
    pub amount: Option<i64>,

    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub last_payment_error: Option<StripePaymentError>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripePaymentError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl StripePaymentIntentObject {
    /// Human-readable failure reason, if Stripe supplied one.
    pub fn failure_reason(&self) -> Option<&str> {
        self.last_payment_error
            .as_ref()
            .and_then(|e| e.message.as_deref().or(e.code.as_deref()))
    }
}

/// Builder for creating test StripeEvent instances.
#[cfg(test)]
pub struct StripeEventBuilder {
    id: String,
    event_type: String,
    created: i64,
    object: serde_json::Value,
}

#[cfg(test)]
impl Default for StripeEventBuilder {
    fn default() -> Self {
        Self {
            id: "evt_test_123".to_string(),
            event_type: "checkout.session.completed".to_string(),
            created: chrono::Utc::now().timestamp(),
            object: serde_json::json!({}),
        }
    }
}

#[cfg(test)]
impl StripeEventBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn event_type(mut self, event_type: StripeEventType) -> Self {
        self.event_type = event_type.as_str().to_string();
        self
    }

    pub fn raw_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = event_type.into();
        self
    }

    pub fn object(mut self, object: serde_json::Value) -> Self {
        self.object = object;
        self
    }

    pub fn build(self) -> StripeEvent {
        StripeEvent {
            id: self.id,
            event_type: self.event_type,
            created: self.created,
            data: StripeEventData {
                object: self.object,
                previous_attributes: None,
            },
            livemode: false,
            api_version: Some("2023-10-16".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_event_type_strings() {
        assert_eq!(
            StripeEventType::parse("checkout.session.completed"),
            StripeEventType::CheckoutSessionCompleted
        );
        assert_eq!(
            StripeEventType::parse("checkout.session.async_payment_succeeded"),
            StripeEventType::CheckoutSessionAsyncPaymentSucceeded
        );
        assert_eq!(
            StripeEventType::parse("payment_intent.payment_failed"),
            StripeEventType::PaymentIntentPaymentFailed
        );
        assert_eq!(
            StripeEventType::parse("customer.created"),
            StripeEventType::Unknown
        );
    }

    #[test]
    fn deserializes_minimal_event() {
        let json = r#"{
            "id": "evt_1",
            "type": "payment_intent.succeeded",
            "created": 1700000000,
            "data": { "object": { "id": "pi_1" } }
        }"#;
        let event: StripeEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.parsed_type(), StripeEventType::PaymentIntentSucceeded);
        assert!(!event.livemode);
        assert!(event.api_version.is_none());
    }

    #[test]
    fn session_object_converts_to_completed_checkout() {
        let event = StripeEventBuilder::new()
            .object(serde_json::json!({
                "id": "cs_test_1",
                "payment_intent": "pi_1",
                "amount_total": 7500,
                "payment_status": "paid",
                "customer_details": { "email": "buyer@example.com" },
                "metadata": { "v": "1", "type": "cart" }
            }))
            .build();

        let session: StripeCheckoutSessionObject = event.deserialize_object().unwrap();
        let completed = CompletedCheckout::from(session);

        assert_eq!(completed.session_id, "cs_test_1");
        assert_eq!(completed.payment_intent_id.as_deref(), Some("pi_1"));
        assert_eq!(completed.amount_total, Some(7500));
        assert_eq!(completed.payment_status, PaymentStatus::Paid);
        assert_eq!(completed.customer_email.as_deref(), Some("buyer@example.com"));
        assert_eq!(completed.metadata.get("type").map(String::as_str), Some("cart"));
    }

    #[test]
    fn session_without_payment_status_is_unknown() {
        let session: StripeCheckoutSessionObject =
            serde_json::from_value(serde_json::json!({ "id": "cs_1" })).unwrap();
        let completed = CompletedCheckout::from(session);
        assert_eq!(completed.payment_status, PaymentStatus::Unknown);
        assert!(completed.metadata.is_empty());
    }

    #[test]
    fn payment_intent_failure_reason_prefers_message() {
        let pi: StripePaymentIntentObject = serde_json::from_value(serde_json::json!({
            "id": "pi_1",
            "last_payment_error": { "code": "card_declined", "message": "Your card was declined." }
        }))
        .unwrap();
        assert_eq!(pi.failure_reason(), Some("Your card was declined."));
    }
}
