//! CreateCheckoutSessionHandler - Turns the shopper's cart into a hosted
//! payment page.
//!
//! The amount charged for each line is frozen into the metadata envelope,
//! so reconciliation records what was paid even if the offer changes
//! afterwards. One checkout carries at most [`MAX_CHECKOUT_ITEMS`] lines.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::domain::cart::{CartItem, CartLine};
use crate::domain::checkout::{
    line_item_description, line_item_name, AppliedOffer, CartCheckout, CheckoutError,
    CheckoutKind, CheckoutLineItem, CheckoutMetadata, MAX_CHECKOUT_ITEMS,
};
use crate::domain::foundation::{Money, OfferId, SubjectId, Timestamp, UserId};
use crate::domain::offer::{DiscountAllocation, Offer, OfferCode};
use crate::ports::{CartRepository, CatalogReader, CreateCheckoutRequest, OfferRepository, PaymentProvider};

/// Shown when the catalog no longer knows a subject or content type.
const UNKNOWN_SUBJECT_TITLE: &str = "Course";
const UNKNOWN_CONTENT_TYPE_NAME: &str = "Course Content";

/// Command to start checkout for the caller's cart.
#[derive(Debug, Clone)]
pub struct CreateCheckoutSessionCommand {
    pub user_id: UserId,
    pub customer_email: Option<String>,
    pub offer_code: Option<String>,
    pub offer_id: Option<OfferId>,
    /// Public origin the provider redirects back to.
    pub base_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCheckoutSessionResult {
    pub session_id: String,
    pub url: String,
    pub subtotal: Money,
    pub discount: Money,
    pub amount_due: Money,
}

pub struct CreateCheckoutSessionHandler {
    carts: Arc<dyn CartRepository>,
    offers: Arc<dyn OfferRepository>,
    catalog: Arc<dyn CatalogReader>,
    payment_provider: Arc<dyn PaymentProvider>,
}

impl CreateCheckoutSessionHandler {
    pub fn new(
        carts: Arc<dyn CartRepository>,
        offers: Arc<dyn OfferRepository>,
        catalog: Arc<dyn CatalogReader>,
        payment_provider: Arc<dyn PaymentProvider>,
    ) -> Self {
        Self {
            carts,
            offers,
            catalog,
            payment_provider,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreateCheckoutSessionCommand,
    ) -> Result<CreateCheckoutSessionResult, CheckoutError> {
        let items = self.carts.list_for_user(&cmd.user_id).await?;
        if items.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        if items.len() > MAX_CHECKOUT_ITEMS {
            return Err(CheckoutError::Validation(format!(
                "A checkout holds at most {} items; remove {} and check them out separately",
                MAX_CHECKOUT_ITEMS,
                items.len() - MAX_CHECKOUT_ITEMS
            )));
        }

        let offer = self
            .redeemable_offer(cmd.offer_code.as_deref(), cmd.offer_id, Timestamp::now())
            .await?;
        let allocation = match &offer {
            Some(offer) => DiscountAllocation::compute(offer, &items),
            None => DiscountAllocation::none(&items),
        };

        let line_items = self
            .line_items(&items, &allocation, offer.as_ref().map(|o| &o.code))
            .await?;

        let envelope = CheckoutMetadata::Cart(CartCheckout {
            user_id: cmd.user_id.clone(),
            cart_item_ids: items.iter().map(|i| i.id).collect(),
            line_amounts: items
                .iter()
                .map(|i| i.price - allocation.discount_for(i.id))
                .collect(),
            offer: offer.as_ref().map(|o| AppliedOffer {
                offer_id: o.id,
                offer_code: Some(o.code.to_string()),
                discount_amount: Some(allocation.total()),
            }),
        });
        let metadata = envelope
            .to_provider_metadata()
            .map_err(|e| CheckoutError::Validation(e.to_string()))?;

        let kind = CheckoutKind::Course;
        let request = CreateCheckoutRequest {
            line_items,
            metadata,
            success_url: kind.success_url(&cmd.base_url),
            cancel_url: kind.cancel_url(&cmd.base_url),
            customer_email: cmd.customer_email.clone(),
            client_reference_id: Some(cmd.user_id.to_string()),
            idempotency_key: None,
        };

        let session = self
            .payment_provider
            .create_checkout_session(request)
            .await
            .map_err(|e| {
                tracing::error!(user_id = %cmd.user_id, error = %e, "Checkout session creation failed");
                CheckoutError::CheckoutCreation(e.message)
            })?;

        tracing::info!(
            user_id = %cmd.user_id,
            session_id = %session.id,
            items = items.len(),
            discount = %allocation.total(),
            "Checkout session created"
        );

        Ok(CreateCheckoutSessionResult {
            session_id: session.id,
            url: session.url,
            subtotal: allocation.subtotal(),
            discount: allocation.total(),
            amount_due: allocation.amount_due(),
        })
    }

    /// Looks up and validates the offer. Any failed check means no offer.
    async fn redeemable_offer(
        &self,
        code: Option<&str>,
        offer_id: Option<OfferId>,
        now: Timestamp,
    ) -> Result<Option<Offer>, CheckoutError> {
        let Some(raw_code) = code.filter(|c| !c.trim().is_empty()) else {
            return Ok(None);
        };
        let Ok(code) = OfferCode::try_new(raw_code) else {
            tracing::info!(code = raw_code, "Ignoring malformed offer code");
            return Ok(None);
        };

        let offer = match offer_id {
            Some(id) => match self.offers.find_by_id(&id).await? {
                Some(offer) => Some(offer),
                None => self.offers.find_by_code(&code).await?,
            },
            None => self.offers.find_by_code(&code).await?,
        };

        let Some(offer) = offer else {
            tracing::info!(code = %code, "Offer not found; checking out without discount");
            return Ok(None);
        };

        match offer.check_redeemable(code.as_str(), now) {
            Ok(()) => Ok(Some(offer)),
            Err(reason) => {
                tracing::info!(offer_id = %offer.id, %reason, "Offer not applied");
                Ok(None)
            }
        }
    }

    async fn line_items(
        &self,
        items: &[CartItem],
        allocation: &DiscountAllocation,
        code: Option<&OfferCode>,
    ) -> Result<Vec<CheckoutLineItem>, CheckoutError> {
        let subject_ids: Vec<SubjectId> = items
            .iter()
            .map(|i| i.subject_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let titles: HashMap<SubjectId, String> = self
            .catalog
            .find_subjects(&subject_ids)
            .await?
            .into_iter()
            .map(|s| (s.id, s.title))
            .collect();
        let content_type_names: HashMap<_, _> = self
            .catalog
            .list_content_types()
            .await?
            .into_iter()
            .map(|ct| (ct.id, ct.name))
            .collect();

        Ok(items
            .iter()
            .map(|item| {
                let title = titles
                    .get(&item.subject_id)
                    .map(String::as_str)
                    .unwrap_or(UNKNOWN_SUBJECT_TITLE);
                let content_type_name = match item.line() {
                    CartLine::Single { content_type_id } => Some(
                        content_type_names
                            .get(&content_type_id)
                            .map(String::as_str)
                            .unwrap_or(UNKNOWN_CONTENT_TYPE_NAME),
                    ),
                    CartLine::Bundle => None,
                };
                let discount = allocation.discount_for(item.id);

                CheckoutLineItem::new(
                    line_item_name(title, content_type_name),
                    line_item_description(None, code, discount),
                    item.price - discount,
                )
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;
    use crate::adapters::stripe::MockPaymentProvider;
    use crate::domain::catalog::{ContentType, Subject};
    use crate::domain::checkout::CheckoutMetadata;
    use crate::domain::foundation::ContentTypeId;
    use crate::domain::offer::Discount;
    use crate::ports::PaymentError;
    use rust_decimal_macros::dec;

    // ════════════════════════════════════════════════════════════════════════════
    // Fixtures
    // ════════════════════════════════════════════════════════════════════════════

    struct Fixture {
        store: InMemoryStore,
        provider: Arc<MockPaymentProvider>,
        handler: CreateCheckoutSessionHandler,
        user: UserId,
        algebra: SubjectId,
        geometry: SubjectId,
        videos: ContentTypeId,
    }

    async fn fixture() -> Fixture {
        let store = InMemoryStore::new();
        let provider = Arc::new(MockPaymentProvider::new());
        let algebra = SubjectId::new();
        let geometry = SubjectId::new();
        let videos = ContentTypeId::new();
        store.seed_subject(Subject::new(algebra, "Algebra")).await;
        store.seed_subject(Subject::new(geometry, "Geometry")).await;
        store.seed_content_type(ContentType::new(videos, "Videos")).await;

        let shared = Arc::new(store.clone());
        let handler = CreateCheckoutSessionHandler::new(
            shared.clone(),
            shared.clone(),
            shared,
            provider.clone(),
        );

        Fixture {
            store,
            provider,
            handler,
            user: UserId::new("user-1").unwrap(),
            algebra,
            geometry,
            videos,
        }
    }

    fn money(v: rust_decimal::Decimal) -> Money {
        Money::try_new(v).unwrap()
    }

    fn command(f: &Fixture, code: Option<&str>) -> CreateCheckoutSessionCommand {
        CreateCheckoutSessionCommand {
            user_id: f.user.clone(),
            customer_email: Some("buyer@example.com".to_string()),
            offer_code: code.map(str::to_string),
            offer_id: None,
            base_url: "https://learn.example.com".to_string(),
        }
    }

    fn live_offer(code: &str, discount: Discount) -> Offer {
        let now = Timestamp::now();
        Offer::new(OfferCode::try_new(code).unwrap(), discount, now.add_days(-1), now.add_days(1))
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn empty_cart_is_rejected() {
        let f = fixture().await;
        let result = f.handler.handle(command(&f, None)).await;
        assert!(matches!(result, Err(CheckoutError::EmptyCart)));
        assert!(f.provider.created_requests().is_empty());
    }

    #[tokio::test]
    async fn percentage_offer_discounts_matching_subject() {
        let f = fixture().await;
        f.store
            .seed_cart_item(CartItem::bundle(f.user.clone(), f.algebra, money(dec!(100))))
            .await;
        f.store
            .seed_offer(live_offer("SPRING25", Discount::percentage(dec!(25)).unwrap()).scoped_to_subject(f.algebra))
            .await;

        let result = f.handler.handle(command(&f, Some("spring25"))).await.unwrap();

        assert_eq!(result.discount, money(dec!(25)));
        assert_eq!(result.amount_due, money(dec!(75)));

        let request = f.provider.last_request().unwrap();
        let line = &request.line_items[0];
        assert_eq!(line.name, "Algebra - Complete Bundle");
        assert_eq!(line.unit_amount, money(dec!(75)));
        assert_eq!(
            line.description.as_deref(),
            Some("Discount code SPRING25 applied: -25.00")
        );
        match CheckoutMetadata::from_provider_metadata(&request.metadata).unwrap() {
            CheckoutMetadata::Cart(cart) => assert_eq!(cart.line_amounts, vec![money(dec!(75))]),
            other => panic!("unexpected envelope {:?}", other),
        }
    }

    #[tokio::test]
    async fn fixed_offer_is_split_proportionally() {
        let f = fixture().await;
        f.store
            .seed_cart_item(CartItem::bundle(f.user.clone(), f.algebra, money(dec!(100))))
            .await;
        f.store
            .seed_cart_item(
                CartItem::single(f.user.clone(), f.geometry, f.videos, money(dec!(50))),
            )
            .await;
        f.store
            .seed_offer(live_offer("TAKE30", Discount::fixed(money(dec!(30)))))
            .await;

        let result = f.handler.handle(command(&f, Some("TAKE30"))).await.unwrap();

        assert_eq!(result.discount, money(dec!(30)));
        let request = f.provider.last_request().unwrap();
        let amounts: Vec<Money> = request.line_items.iter().map(|l| l.unit_amount).collect();
        assert!(amounts.contains(&money(dec!(80))));
        assert!(amounts.contains(&money(dec!(40))));
        assert!(request
            .line_items
            .iter()
            .any(|l| l.name == "Geometry - Videos"));
    }

    #[tokio::test]
    async fn expired_offer_is_silently_ignored() {
        let f = fixture().await;
        f.store
            .seed_cart_item(CartItem::bundle(f.user.clone(), f.algebra, money(dec!(100))))
            .await;
        let now = Timestamp::now();
        f.store
            .seed_offer(Offer::new(
                OfferCode::try_new("OLD").unwrap(),
                Discount::percentage(dec!(50)).unwrap(),
                now.add_days(-10),
                now.add_days(-1),
            ))
            .await;

        let result = f.handler.handle(command(&f, Some("OLD"))).await.unwrap();

        assert_eq!(result.discount, Money::ZERO);
        assert_eq!(result.amount_due, money(dec!(100)));
        let envelope =
            CheckoutMetadata::from_provider_metadata(&f.provider.last_request().unwrap().metadata)
                .unwrap();
        assert!(matches!(envelope, CheckoutMetadata::Cart(ref c) if c.offer.is_none()));
    }

    #[tokio::test]
    async fn metadata_and_urls_describe_the_cart() {
        let f = fixture().await;
        let item = CartItem::bundle(f.user.clone(), f.algebra, money(dec!(40)));
        f.store.seed_cart_item(item.clone()).await;

        f.handler.handle(command(&f, None)).await.unwrap();

        let request = f.provider.last_request().unwrap();
        assert_eq!(
            request.success_url,
            "https://learn.example.com/checkout/success?session_id={CHECKOUT_SESSION_ID}&type=course"
        );
        assert_eq!(request.cancel_url, "https://learn.example.com/cart");
        match CheckoutMetadata::from_provider_metadata(&request.metadata).unwrap() {
            CheckoutMetadata::Cart(cart) => {
                assert_eq!(cart.user_id, f.user);
                assert_eq!(cart.cart_item_ids, vec![item.id]);
            }
            other => panic!("unexpected envelope {:?}", other),
        }
    }

    #[tokio::test]
    async fn cart_over_the_line_limit_is_rejected_before_the_provider() {
        let f = fixture().await;
        for _ in 0..=MAX_CHECKOUT_ITEMS {
            f.store
                .seed_cart_item(CartItem::bundle(f.user.clone(), SubjectId::new(), money(dec!(10))))
                .await;
        }

        let result = f.handler.handle(command(&f, None)).await;

        match result {
            Err(CheckoutError::Validation(message)) => assert!(message.contains("at most 12")),
            other => panic!("expected validation error, got {:?}", other),
        }
        assert!(f.provider.created_requests().is_empty());
    }

    #[tokio::test]
    async fn cart_at_the_line_limit_checks_out() {
        let f = fixture().await;
        for _ in 0..MAX_CHECKOUT_ITEMS {
            f.store
                .seed_cart_item(CartItem::bundle(f.user.clone(), SubjectId::new(), money(dec!(10))))
                .await;
        }

        let result = f.handler.handle(command(&f, None)).await.unwrap();

        assert_eq!(result.amount_due, money(dec!(120)));
        assert_eq!(f.provider.last_request().unwrap().line_items.len(), MAX_CHECKOUT_ITEMS);
    }

    #[tokio::test]
    async fn provider_failure_is_checkout_creation_error() {
        let f = fixture().await;
        f.store
            .seed_cart_item(CartItem::bundle(f.user.clone(), f.algebra, money(dec!(40))))
            .await;
        f.provider.fail_create(PaymentError::network("connection reset"));

        let result = f.handler.handle(command(&f, None)).await;

        assert!(matches!(result, Err(CheckoutError::CheckoutCreation(_))));
        // Cart survives a failed attempt.
        assert_eq!(f.store.cart_for(&f.user).await.len(), 1);
    }
}
