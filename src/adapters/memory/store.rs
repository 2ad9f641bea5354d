//! Shared state behind the in-memory adapters.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::domain::access::UserAccess;
use crate::domain::booking::SessionBooking;
use crate::domain::cart::{CartItem, CartLine};
use crate::domain::catalog::{ContentType, SessionType, Subject};
use crate::domain::foundation::{
    BookingId, DomainError, Money, OfferId, SessionTypeId, SubjectId, UserId,
};
use crate::domain::offer::Offer;
use crate::domain::purchase::Purchase;
use crate::ports::WebhookEventRecord;

#[derive(Default)]
pub(super) struct State {
    pub subjects: HashMap<SubjectId, Subject>,
    pub content_types: Vec<ContentType>,
    pub course_prices: HashMap<(SubjectId, CartLine), Money>,
    pub session_types: HashMap<SessionTypeId, SessionType>,
    pub offers: HashMap<OfferId, Offer>,
    pub cart: Vec<CartItem>,
    pub purchases: Vec<Purchase>,
    pub access: Vec<UserAccess>,
    pub bookings: HashMap<BookingId, SessionBooking>,
    pub webhook_events: HashMap<String, WebhookEventRecord>,
}

/// In-memory implementation of every storage port.
///
/// Cloning shares the underlying state.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    pub(super) state: Arc<RwLock<State>>,
    fail_writes: Arc<AtomicBool>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes ledger commits and booking updates fail with a database error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub(super) fn check_writable(&self) -> Result<(), DomainError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DomainError::database("Simulated write failure"));
        }
        Ok(())
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Seeding
    // ════════════════════════════════════════════════════════════════════════════

    pub async fn seed_subject(&self, subject: Subject) {
        self.state.write().await.subjects.insert(subject.id, subject);
    }

    pub async fn seed_content_type(&self, content_type: ContentType) {
        self.state.write().await.content_types.push(content_type);
    }

    pub async fn seed_course_price(&self, subject_id: SubjectId, line: CartLine, price: Money) {
        self.state
            .write()
            .await
            .course_prices
            .insert((subject_id, line), price);
    }

    pub async fn seed_session_type(&self, session_type: SessionType) {
        self.state
            .write()
            .await
            .session_types
            .insert(session_type.id, session_type);
    }

    pub async fn seed_offer(&self, offer: Offer) {
        self.state.write().await.offers.insert(offer.id, offer);
    }

    pub async fn seed_cart_item(&self, item: CartItem) {
        self.state.write().await.cart.push(item);
    }

    pub async fn seed_access(&self, access: UserAccess) {
        self.state.write().await.access.push(access);
    }

    pub async fn seed_booking(&self, booking: SessionBooking) {
        self.state.write().await.bookings.insert(booking.id, booking);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Inspection
    // ════════════════════════════════════════════════════════════════════════════

    pub async fn purchases(&self) -> Vec<Purchase> {
        self.state.read().await.purchases.clone()
    }

    pub async fn access_for(&self, user_id: &UserId) -> Vec<UserAccess> {
        self.state
            .read()
            .await
            .access
            .iter()
            .filter(|a| &a.user_id == user_id)
            .cloned()
            .collect()
    }

    pub async fn cart_for(&self, user_id: &UserId) -> Vec<CartItem> {
        self.state
            .read()
            .await
            .cart
            .iter()
            .filter(|i| &i.user_id == user_id)
            .cloned()
            .collect()
    }

    pub async fn offer(&self, id: &OfferId) -> Option<Offer> {
        self.state.read().await.offers.get(id).cloned()
    }

    pub async fn booking(&self, id: &BookingId) -> Option<SessionBooking> {
        self.state.read().await.bookings.get(id).cloned()
    }

    pub async fn webhook_event_count(&self) -> usize {
        self.state.read().await.webhook_events.len()
    }
}
