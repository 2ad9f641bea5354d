//! ReconcileCheckoutHandler - Materializes a completed checkout.
//!
//! Both entry points (the provider webhook and the success-page fallback)
//! land here, possibly at the same moment for the same session. Nothing in
//! this handler locks; correctness comes from the storage constraints:
//!
//! - `(stripe_session_id, cart_item_id)` is unique on purchases, and the
//!   ledger commit reports zero inserted rows when another run got there first
//! - `(user_id, subject_id, content_type_id)` is unique on access rows
//! - booking confirmation is a conditional update
//!
//! The `exists_for_session` read is only a fast path.

use std::collections::HashSet;
use std::sync::Arc;

use crate::domain::access::AccessGrantResolver;
use crate::domain::booking::SessionBooking;
use crate::domain::cart::CartItem;
use crate::domain::checkout::{
    BookingCheckout, CartCheckout, CheckoutError, CheckoutMetadata, CompletedCheckout,
};
use crate::domain::foundation::{BookingId, Money};
use crate::domain::offer::DiscountAllocation;
use crate::domain::purchase::Purchase;
use crate::ports::{
    BookingConfirmation, BookingRepository, CartRepository, CatalogReader, NotificationSender,
    OfferRepository, PurchaseLedger, PurchasePlan, PurchaseRepository, UserAccessRepository,
};

/// What a reconciliation run did.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileOutcome {
    /// This run materialized the cart.
    Purchased {
        purchases: Vec<Purchase>,
        access_granted: u64,
    },
    /// This run confirmed a session booking.
    BookingConfirmed { booking_id: BookingId },
    /// Another run (or an earlier delivery) already did the work.
    AlreadyProcessed,
}

impl ReconcileOutcome {
    pub fn is_already_processed(&self) -> bool {
        matches!(self, ReconcileOutcome::AlreadyProcessed)
    }
}

/// Storage and notification ports the reconciler writes through.
#[derive(Clone)]
pub struct ReconcileDeps {
    pub purchases: Arc<dyn PurchaseRepository>,
    pub ledger: Arc<dyn PurchaseLedger>,
    pub carts: Arc<dyn CartRepository>,
    pub offers: Arc<dyn OfferRepository>,
    pub catalog: Arc<dyn CatalogReader>,
    pub access: Arc<dyn UserAccessRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub notifier: Arc<dyn NotificationSender>,
}

pub struct ReconcileCheckoutHandler {
    deps: ReconcileDeps,
}

impl ReconcileCheckoutHandler {
    pub fn new(deps: ReconcileDeps) -> Self {
        Self { deps }
    }

    pub async fn handle(&self, session: &CompletedCheckout) -> Result<ReconcileOutcome, CheckoutError> {
        let envelope = session.envelope().map_err(|e| {
            tracing::warn!(session_id = %session.session_id, error = %e, "Checkout session metadata unusable");
            CheckoutError::MalformedSession(e.to_string())
        })?;

        if !session.payment_status.is_settled() {
            tracing::info!(
                session_id = %session.session_id,
                status = ?session.payment_status,
                "Checkout session not yet paid"
            );
            return Err(CheckoutError::NotPaid);
        }

        match envelope {
            CheckoutMetadata::Cart(cart) => self.reconcile_cart(session, cart).await,
            CheckoutMetadata::SessionBooking(booking) => {
                self.confirm_booking(session, booking).await
            }
        }
    }

    async fn reconcile_cart(
        &self,
        session: &CompletedCheckout,
        cart: CartCheckout,
    ) -> Result<ReconcileOutcome, CheckoutError> {
        if self.deps.purchases.exists_for_session(&session.session_id).await? {
            tracing::debug!(session_id = %session.session_id, "Session already materialized");
            return Ok(ReconcileOutcome::AlreadyProcessed);
        }

        let wanted: HashSet<_> = cart.cart_item_ids.iter().copied().collect();
        let items: Vec<_> = self
            .deps
            .carts
            .list_for_user(&cart.user_id)
            .await?
            .into_iter()
            .filter(|item| wanted.contains(&item.id))
            .collect();

        if items.is_empty() {
            tracing::info!(
                session_id = %session.session_id,
                user_id = %cart.user_id,
                "No matching cart items left; treating session as processed"
            );
            return Ok(ReconcileOutcome::AlreadyProcessed);
        }

        let charged = self.charged_amounts(&cart, &items).await?;
        let total: Money = charged.iter().copied().sum();
        if let Some(paid) = session.amount_paid() {
            if paid != total {
                tracing::warn!(
                    session_id = %session.session_id,
                    amount_total = %paid,
                    recorded = %total,
                    "Recorded purchase total differs from provider total"
                );
            }
        }

        let purchases: Vec<Purchase> = items
            .iter()
            .zip(charged)
            .map(|(item, amount)| {
                Purchase::paid_from_cart_item(
                    item,
                    amount,
                    session.session_id.clone(),
                    session.payment_intent_id.clone(),
                )
            })
            .collect();

        let resolver = AccessGrantResolver::new(self.deps.catalog.list_content_types().await?);
        let existing: HashSet<_> = self
            .deps
            .access
            .list_for_user(&cart.user_id)
            .await?
            .iter()
            .map(|a| a.key())
            .collect();
        let grants = resolver.resolve(&purchases, &existing);

        let plan = PurchasePlan {
            user_id: cart.user_id.clone(),
            purchases,
            grants,
        };
        let outcome = self.deps.ledger.commit(&plan).await?;

        if outcome.lost_race() {
            tracing::info!(
                session_id = %session.session_id,
                "Concurrent reconciliation won; nothing written"
            );
            return Ok(ReconcileOutcome::AlreadyProcessed);
        }

        if let Some(applied) = &cart.offer {
            match self.deps.offers.increment_usage(&applied.offer_id).await {
                Ok(true) => {}
                Ok(false) => tracing::warn!(
                    offer_id = %applied.offer_id,
                    "Offer usage not incremented; already at its limit"
                ),
                Err(e) => tracing::warn!(
                    offer_id = %applied.offer_id,
                    error = %e,
                    "Failed to increment offer usage"
                ),
            }
        }

        tracing::info!(
            session_id = %session.session_id,
            user_id = %cart.user_id,
            purchases = outcome.purchases_inserted,
            access_granted = outcome.access_granted,
            "Checkout reconciled"
        );

        Ok(ReconcileOutcome::Purchased {
            purchases: plan.purchases,
            access_granted: outcome.access_granted,
        })
    }

    /// What each line was charged, in `items` order.
    ///
    /// Amounts frozen into the envelope at checkout win. Older envelopes
    /// carry none, so the allocation is recomputed from the offer as it
    /// stands now.
    async fn charged_amounts(
        &self,
        cart: &CartCheckout,
        items: &[CartItem],
    ) -> Result<Vec<Money>, CheckoutError> {
        let frozen: Option<Vec<Money>> = items.iter().map(|i| cart.charged_for(i.id)).collect();
        if let Some(amounts) = frozen {
            return Ok(amounts);
        }

        tracing::warn!(user_id = %cart.user_id, "Envelope has no line amounts; recomputing discount");
        let allocation = match &cart.offer {
            Some(applied) => match self.deps.offers.find_by_id(&applied.offer_id).await? {
                Some(offer) => DiscountAllocation::compute(&offer, items),
                None => {
                    tracing::warn!(offer_id = %applied.offer_id, "Applied offer no longer exists");
                    DiscountAllocation::none(items)
                }
            },
            None => DiscountAllocation::none(items),
        };
        Ok(items
            .iter()
            .map(|item| item.price - allocation.discount_for(item.id))
            .collect())
    }

    async fn confirm_booking(
        &self,
        session: &CompletedCheckout,
        envelope: BookingCheckout,
    ) -> Result<ReconcileOutcome, CheckoutError> {
        let booking = self
            .deps
            .bookings
            .find_by_id(&envelope.booking_id)
            .await?
            .ok_or_else(|| CheckoutError::not_found(format!("Booking {}", envelope.booking_id)))?;

        if booking.is_payment_recorded() {
            return Ok(ReconcileOutcome::AlreadyProcessed);
        }

        let session_type = self
            .deps
            .catalog
            .find_session_type(&booking.session_type_id)
            .await?;
        let amount_paid = match (session.amount_paid(), &session_type) {
            (Some(paid), _) => paid,
            (None, Some(session_type)) => {
                tracing::warn!(
                    booking_id = %booking.id,
                    session_id = %session.session_id,
                    "Session has no amount_total; recording the list price"
                );
                session_type.price
            }
            (None, None) => {
                tracing::warn!(
                    booking_id = %booking.id,
                    session_id = %session.session_id,
                    "Session has no amount_total and its session type is gone; recording zero"
                );
                Money::ZERO
            }
        };

        let confirmed = self
            .deps
            .bookings
            .confirm_payment(&booking.id, session.payment_intent_id.as_deref(), amount_paid)
            .await?;
        if !confirmed {
            return Ok(ReconcileOutcome::AlreadyProcessed);
        }

        tracing::info!(
            booking_id = %booking.id,
            session_id = %session.session_id,
            amount = %amount_paid,
            "Session booking confirmed"
        );

        match session_type {
            Some(session_type) => {
                let confirmation = BookingConfirmation {
                    booking_id: booking.id,
                    recipient: recipient(&booking, session),
                    contact_name: booking.contact_name.clone(),
                    session_type_name: session_type.name,
                    duration_minutes: session_type.duration_minutes,
                    amount_paid,
                    scheduled_at: booking.scheduled_at,
                };
                if let Err(e) = self.deps.notifier.send_booking_confirmation(&confirmation).await {
                    tracing::error!(
                        booking_id = %booking.id,
                        error = %e,
                        "Booking confirmation email failed"
                    );
                }
            }
            None => tracing::warn!(
                booking_id = %booking.id,
                "Session type missing; skipping confirmation email"
            ),
        }

        Ok(ReconcileOutcome::BookingConfirmed {
            booking_id: booking.id,
        })
    }
}

fn recipient(booking: &SessionBooking, session: &CompletedCheckout) -> String {
    if booking.contact_email.trim().is_empty() {
        session.customer_email.clone().unwrap_or_default()
    } else {
        booking.contact_email.clone()
    }
}
