//! CreateBookingCheckoutHandler - Starts payment for a 1:1 session booking.

use std::sync::Arc;

use crate::domain::booking::SessionBooking;
use crate::domain::checkout::{
    BookingCheckout, CheckoutError, CheckoutKind, CheckoutLineItem, CheckoutMetadata,
};
use crate::domain::foundation::{BookingId, SessionTypeId, Timestamp, UserId};
use crate::ports::{BookingRepository, CatalogReader, CreateCheckoutRequest, PaymentProvider};

#[derive(Debug, Clone)]
pub struct CreateBookingCheckoutCommand {
    /// Set when the shopper is signed in; guests may book too.
    pub user_id: Option<UserId>,
    pub session_type_id: SessionTypeId,
    pub contact_email: String,
    pub contact_name: Option<String>,
    pub scheduled_at: Option<Timestamp>,
    pub base_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateBookingCheckoutResult {
    pub booking_id: BookingId,
    pub session_id: String,
    pub url: String,
}

pub struct CreateBookingCheckoutHandler {
    catalog: Arc<dyn CatalogReader>,
    bookings: Arc<dyn BookingRepository>,
    payment_provider: Arc<dyn PaymentProvider>,
}

impl CreateBookingCheckoutHandler {
    pub fn new(
        catalog: Arc<dyn CatalogReader>,
        bookings: Arc<dyn BookingRepository>,
        payment_provider: Arc<dyn PaymentProvider>,
    ) -> Self {
        Self {
            catalog,
            bookings,
            payment_provider,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreateBookingCheckoutCommand,
    ) -> Result<CreateBookingCheckoutResult, CheckoutError> {
        let session_type = self
            .catalog
            .find_session_type(&cmd.session_type_id)
            .await?
            .ok_or_else(|| CheckoutError::not_found(format!("Session type {}", cmd.session_type_id)))?;

        let booking = SessionBooking::pending(
            cmd.user_id.clone(),
            session_type.id,
            cmd.contact_email.trim(),
            cmd.contact_name.clone(),
            cmd.scheduled_at,
        )?;
        self.bookings.insert(&booking).await?;

        let metadata = CheckoutMetadata::SessionBooking(BookingCheckout {
            booking_id: booking.id,
            user_id: cmd.user_id.clone(),
        })
        .to_provider_metadata()
        .map_err(|e| CheckoutError::Validation(e.to_string()))?;

        let kind = CheckoutKind::Session;
        let request = CreateCheckoutRequest {
            line_items: vec![CheckoutLineItem::new(
                session_type.name.clone(),
                Some(format!("{} minute 1:1 session", session_type.duration_minutes)),
                session_type.price,
            )],
            metadata,
            success_url: kind.success_url(&cmd.base_url),
            cancel_url: kind.cancel_url(&cmd.base_url),
            customer_email: Some(booking.contact_email.clone()),
            client_reference_id: Some(booking.id.to_string()),
            idempotency_key: Some(format!("booking-{}", booking.id)),
        };

        let session = self
            .payment_provider
            .create_checkout_session(request)
            .await
            .map_err(|e| {
                tracing::error!(booking_id = %booking.id, error = %e, "Booking checkout creation failed");
                CheckoutError::CheckoutCreation(e.message)
            })?;

        self.bookings
            .attach_checkout_session(&booking.id, &session.id)
            .await?;

        tracing::info!(
            booking_id = %booking.id,
            session_id = %session.id,
            session_type = %session_type.name,
            "Booking checkout session created"
        );

        Ok(CreateBookingCheckoutResult {
            booking_id: booking.id,
            session_id: session.id,
            url: session.url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;
    use crate::adapters::stripe::MockPaymentProvider;
    use crate::domain::booking::BookingStatus;
    use crate::domain::catalog::SessionType;
    use crate::domain::foundation::Money;
    use crate::ports::PaymentError;
    use rust_decimal_macros::dec;

    async fn setup() -> (InMemoryStore, Arc<MockPaymentProvider>, CreateBookingCheckoutHandler, SessionType) {
        let store = InMemoryStore::new();
        let provider = Arc::new(MockPaymentProvider::new());
        let session_type = SessionType {
            id: SessionTypeId::new(),
            name: "Essay Review".to_string(),
            price: Money::try_new(dec!(45)).unwrap(),
            duration_minutes: 30,
        };
        store.seed_session_type(session_type.clone()).await;
        let shared = Arc::new(store.clone());
        let handler = CreateBookingCheckoutHandler::new(shared.clone(), shared, provider.clone());
        (store, provider, handler, session_type)
    }

    fn command(session_type_id: SessionTypeId) -> CreateBookingCheckoutCommand {
        CreateBookingCheckoutCommand {
            user_id: None,
            session_type_id,
            contact_email: "guest@example.com".to_string(),
            contact_name: Some("Alex".to_string()),
            scheduled_at: None,
            base_url: "https://learn.example.com".to_string(),
        }
    }

    #[tokio::test]
    async fn creates_pending_booking_and_attaches_session() {
        let (store, provider, handler, session_type) = setup().await;

        let result = handler.handle(command(session_type.id)).await.unwrap();

        let booking = store.booking(&result.booking_id).await.unwrap();
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.stripe_session_id.as_deref(), Some(result.session_id.as_str()));

        let request = provider.last_request().unwrap();
        assert_eq!(request.line_items[0].unit_amount, session_type.price);
        assert!(request.success_url.ends_with("&type=session"));
        assert_eq!(request.cancel_url, "https://learn.example.com/sessions");
        match CheckoutMetadata::from_provider_metadata(&request.metadata).unwrap() {
            CheckoutMetadata::SessionBooking(b) => assert_eq!(b.booking_id, result.booking_id),
            other => panic!("unexpected envelope {:?}", other),
        }
    }

    #[tokio::test]
    async fn unknown_session_type_is_not_found() {
        let (_, _, handler, _) = setup().await;
        let result = handler.handle(command(SessionTypeId::new())).await;
        assert!(matches!(result, Err(CheckoutError::NotFound(_))));
    }

    #[tokio::test]
    async fn invalid_email_is_validation_error() {
        let (_, provider, handler, session_type) = setup().await;
        let mut cmd = command(session_type.id);
        cmd.contact_email = "not-an-email".to_string();

        let result = handler.handle(cmd).await;

        assert!(matches!(result, Err(CheckoutError::Validation(_))));
        assert!(provider.created_requests().is_empty());
    }

    #[tokio::test]
    async fn provider_failure_maps_to_checkout_creation() {
        let (_, provider, handler, session_type) = setup().await;
        provider.fail_create(PaymentError::provider("boom"));
        let result = handler.handle(command(session_type.id)).await;
        assert!(matches!(result, Err(CheckoutError::CheckoutCreation(_))));
    }
}
