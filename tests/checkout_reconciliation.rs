//! End-to-end checkout flow against the in-memory adapters.
//!
//! Covers the path a shopper takes: fill the cart, create a checkout with
//! an offer, then reconcile the completed session through both the
//! success-page fallback and the provider webhook. The second trigger
//! must be a no-op.

use std::sync::Arc;

use rust_decimal_macros::dec;
use secrecy::SecretString;
use serde_json::json;

use course_checkout::adapters::email::RecordingNotificationSender;
use course_checkout::adapters::memory::InMemoryStore;
use course_checkout::adapters::stripe::MockPaymentProvider;
use course_checkout::application::{
    AddToCartCommand, AddToCartHandler, CreateCheckoutSessionCommand,
    CreateCheckoutSessionHandler, FailPurchaseHandler, HandlePaymentWebhookCommand,
    HandlePaymentWebhookHandler, ReconcileCheckoutHandler, ReconcileDeps,
    VerifyCheckoutSessionCommand, VerifyCheckoutSessionHandler,
};
use course_checkout::domain::cart::CartLine;
use course_checkout::domain::catalog::{ContentType, Subject};
use course_checkout::domain::checkout::{CheckoutKind, CompletedCheckout, PaymentStatus};
use course_checkout::domain::foundation::{ContentTypeId, Money, SubjectId, Timestamp, UserId};
use course_checkout::domain::offer::{Discount, Offer, OfferCode};
use course_checkout::domain::purchase::PurchaseStatus;
use course_checkout::domain::webhook::{signature_header, StripeWebhookVerifier};
use course_checkout::ports::WebhookResult;

const WEBHOOK_SECRET: &str = "whsec_integration_secret";

// =============================================================================
// Test Infrastructure
// =============================================================================

struct Storefront {
    store: InMemoryStore,
    provider: Arc<MockPaymentProvider>,
    notifier: Arc<RecordingNotificationSender>,
    user: UserId,
    subject: SubjectId,
    videos: ContentTypeId,
    notes: ContentTypeId,
    offer: Offer,
}

impl Storefront {
    async fn new() -> Self {
        let store = InMemoryStore::new();
        let subject = SubjectId::new();
        let videos = ContentTypeId::new();
        let notes = ContentTypeId::new();

        store.seed_subject(Subject::new(subject, "Organic Chemistry")).await;
        store.seed_content_type(ContentType::new(videos, "Videos")).await;
        store.seed_content_type(ContentType::new(notes, "Notes")).await;

        let offer = Offer::new(
            OfferCode::try_new("SPRING20").unwrap(),
            Discount::percentage(dec!(20)).unwrap(),
            Timestamp::now().add_days(-1),
            Timestamp::now().add_days(30),
        )
        .with_max_usage(100);
        store.seed_offer(offer.clone()).await;

        Self {
            store,
            provider: Arc::new(MockPaymentProvider::new()),
            notifier: Arc::new(RecordingNotificationSender::new()),
            user: UserId::new("learner-42").unwrap(),
            subject,
            videos,
            notes,
            offer,
        }
    }

    fn shared(&self) -> Arc<InMemoryStore> {
        Arc::new(self.store.clone())
    }

    fn reconciler(&self) -> Arc<ReconcileCheckoutHandler> {
        let shared = self.shared();
        Arc::new(ReconcileCheckoutHandler::new(ReconcileDeps {
            purchases: shared.clone(),
            ledger: shared.clone(),
            carts: shared.clone(),
            offers: shared.clone(),
            catalog: shared.clone(),
            access: shared.clone(),
            bookings: shared,
            notifier: self.notifier.clone(),
        }))
    }

    fn webhook_handler(&self) -> HandlePaymentWebhookHandler {
        HandlePaymentWebhookHandler::new(
            StripeWebhookVerifier::new(SecretString::new(WEBHOOK_SECRET.to_string())),
            self.shared(),
            self.reconciler(),
            Arc::new(FailPurchaseHandler::new(self.shared())),
        )
    }

    fn verify_handler(&self) -> VerifyCheckoutSessionHandler {
        VerifyCheckoutSessionHandler::new(self.provider.clone(), self.reconciler())
    }

    /// Lists the line in the catalog at `price`, then adds it to the cart.
    async fn add(&self, content_type_id: Option<ContentTypeId>, price: Money) {
        let line = match content_type_id {
            Some(content_type_id) => CartLine::Single { content_type_id },
            None => CartLine::Bundle,
        };
        self.store.seed_course_price(self.subject, line, price).await;

        AddToCartHandler::new(self.shared(), self.shared(), self.shared())
            .handle(AddToCartCommand {
                user_id: self.user.clone(),
                subject_id: self.subject,
                content_type_id,
                is_bundle: content_type_id.is_none(),
            })
            .await
            .unwrap();
    }

    /// Creates a checkout and registers the resulting session as paid.
    async fn checkout_paid(&self, offer_code: Option<&str>) -> CompletedCheckout {
        let handler = CreateCheckoutSessionHandler::new(
            self.shared(),
            self.shared(),
            self.shared(),
            self.provider.clone(),
        );
        let result = handler
            .handle(CreateCheckoutSessionCommand {
                user_id: self.user.clone(),
                customer_email: Some("learner@example.com".to_string()),
                offer_code: offer_code.map(str::to_string),
                offer_id: None,
                base_url: "https://shop.example.com".to_string(),
            })
            .await
            .unwrap();

        let request = self.provider.last_request().unwrap();
        let session = CompletedCheckout {
            session_id: result.session_id,
            payment_intent_id: Some("pi_integration".to_string()),
            amount_total: result.amount_due.to_minor_units(),
            payment_status: PaymentStatus::Paid,
            customer_email: Some("learner@example.com".to_string()),
            metadata: request.metadata,
        };
        self.provider.set_session(session.clone());
        session
    }
}

fn money(value: rust_decimal::Decimal) -> Money {
    Money::try_new(value).unwrap()
}

fn completed_event(event_id: &str, session: &CompletedCheckout) -> HandlePaymentWebhookCommand {
    let body = json!({
        "id": event_id,
        "type": "checkout.session.completed",
        "created": Timestamp::now().as_unix_secs(),
        "data": { "object": {
            "id": session.session_id,
            "payment_intent": session.payment_intent_id,
            "amount_total": session.amount_total,
            "payment_status": "paid",
            "metadata": session.metadata,
        }},
    });
    let payload = serde_json::to_vec(&body).unwrap();
    let signature = signature_header(WEBHOOK_SECRET, Timestamp::now().as_unix_secs(), &payload);
    HandlePaymentWebhookCommand { payload, signature }
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn discounted_checkout_materializes_once_across_both_triggers() {
    let shop = Storefront::new().await;
    shop.add(Some(shop.videos), money(dec!(50))).await;
    shop.add(Some(shop.notes), money(dec!(25))).await;

    let session = shop.checkout_paid(Some("spring20")).await;
    assert_eq!(session.amount_total, Some(6000));

    let verified = shop
        .verify_handler()
        .handle(VerifyCheckoutSessionCommand {
            user_id: shop.user.clone(),
            session_id: session.session_id.clone(),
            kind: CheckoutKind::Course,
        })
        .await
        .unwrap();
    assert!(verified.success);
    assert_eq!(verified.already_processed, Some(false));

    let webhook = shop
        .webhook_handler()
        .handle(completed_event("evt_after_fallback", &session))
        .await
        .unwrap();
    assert_eq!(webhook, WebhookResult::Processed);

    let purchases = shop.store.purchases().await;
    assert_eq!(purchases.len(), 2);
    assert!(purchases.iter().all(|p| p.status == PurchaseStatus::Paid));
    let total: Money = purchases.iter().map(|p| p.amount).sum();
    assert_eq!(total, money(dec!(60)));

    assert_eq!(shop.store.access_for(&shop.user).await.len(), 2);
    assert!(shop.store.cart_for(&shop.user).await.is_empty());
    assert_eq!(shop.store.offer(&shop.offer.id).await.unwrap().current_usage, 1);
}

#[tokio::test]
async fn bundle_purchase_grants_every_content_type() {
    let shop = Storefront::new().await;
    shop.add(None, money(dec!(99))).await;

    let session = shop.checkout_paid(None).await;
    shop.webhook_handler()
        .handle(completed_event("evt_bundle", &session))
        .await
        .unwrap();

    let access = shop.store.access_for(&shop.user).await;
    assert_eq!(access.len(), 2);
    assert!(access.iter().any(|a| a.content_type_id == shop.videos));
    assert!(access.iter().any(|a| a.content_type_id == shop.notes));

    let purchases = shop.store.purchases().await;
    assert_eq!(purchases.len(), 1);
    assert!(purchases[0].is_bundle);
    assert_eq!(purchases[0].amount, money(dec!(99)));
}

#[tokio::test]
async fn redelivered_event_is_acknowledged_without_new_rows() {
    let shop = Storefront::new().await;
    shop.add(Some(shop.videos), money(dec!(40))).await;
    let session = shop.checkout_paid(None).await;
    let handler = shop.webhook_handler();

    handler.handle(completed_event("evt_1", &session)).await.unwrap();
    let again = handler.handle(completed_event("evt_1", &session)).await.unwrap();

    assert_eq!(again, WebhookResult::AlreadyProcessed);
    assert_eq!(shop.store.purchases().await.len(), 1);
    assert_eq!(shop.store.webhook_event_count().await, 1);
}

#[tokio::test]
async fn concurrent_triggers_produce_a_single_purchase_set() {
    let shop = Storefront::new().await;
    shop.add(Some(shop.videos), money(dec!(30))).await;
    shop.add(Some(shop.notes), money(dec!(20))).await;
    let session = shop.checkout_paid(Some("SPRING20")).await;

    let verify = shop.verify_handler();
    let webhook = shop.webhook_handler();
    let (verified, delivered) = tokio::join!(
        verify.handle(VerifyCheckoutSessionCommand {
            user_id: shop.user.clone(),
            session_id: session.session_id.clone(),
            kind: CheckoutKind::Course,
        }),
        webhook.handle(completed_event("evt_race", &session)),
    );

    assert!(verified.unwrap().success);
    delivered.unwrap();
    assert_eq!(shop.store.purchases().await.len(), 2);
    assert_eq!(shop.store.access_for(&shop.user).await.len(), 2);
    assert_eq!(shop.store.offer(&shop.offer.id).await.unwrap().current_usage, 1);
}

#[tokio::test]
async fn failed_write_is_retried_on_redelivery() {
    let shop = Storefront::new().await;
    shop.add(Some(shop.videos), money(dec!(15))).await;
    let session = shop.checkout_paid(None).await;
    let handler = shop.webhook_handler();

    shop.store.set_fail_writes(true);
    assert!(handler.handle(completed_event("evt_retry", &session)).await.is_err());
    assert!(shop.store.purchases().await.is_empty());
    assert_eq!(shop.store.webhook_event_count().await, 0);

    shop.store.set_fail_writes(false);
    let retried = handler.handle(completed_event("evt_retry", &session)).await.unwrap();

    assert_eq!(retried, WebhookResult::Processed);
    assert_eq!(shop.store.purchases().await.len(), 1);
}

#[tokio::test]
async fn offer_change_after_checkout_does_not_alter_recorded_amounts() {
    let shop = Storefront::new().await;
    shop.add(Some(shop.videos), money(dec!(50))).await;
    let session = shop.checkout_paid(Some("SPRING20")).await;
    assert_eq!(session.amount_total, Some(4000));

    let mut edited = shop.offer.clone();
    edited.discount = Discount::percentage(dec!(5)).unwrap();
    edited.is_active = false;
    shop.store.seed_offer(edited).await;

    shop.webhook_handler()
        .handle(completed_event("evt_after_edit", &session))
        .await
        .unwrap();

    let purchases = shop.store.purchases().await;
    assert_eq!(purchases.len(), 1);
    assert_eq!(purchases[0].amount, money(dec!(40)));
}

#[tokio::test]
async fn verify_by_another_user_is_rejected() {
    let shop = Storefront::new().await;
    shop.add(Some(shop.videos), money(dec!(15))).await;
    let session = shop.checkout_paid(None).await;

    let result = shop
        .verify_handler()
        .handle(VerifyCheckoutSessionCommand {
            user_id: UserId::new("someone-else").unwrap(),
            session_id: session.session_id,
            kind: CheckoutKind::Course,
        })
        .await;

    assert!(result.is_err());
    assert!(shop.store.purchases().await.is_empty());
}
