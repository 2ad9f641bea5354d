//! Catalog, offer and cart ports over the in-memory store.

use async_trait::async_trait;

use super::InMemoryStore;
use crate::domain::cart::{CartItem, CartLine};
use crate::domain::catalog::{ContentType, SessionType, Subject};
use crate::domain::foundation::{
    CartItemId, DomainError, Money, OfferId, SessionTypeId, SubjectId, UserId,
};
use crate::domain::offer::{Offer, OfferCode};
use crate::ports::{CartRepository, CatalogReader, OfferRepository};

#[async_trait]
impl CatalogReader for InMemoryStore {
    async fn list_content_types(&self) -> Result<Vec<ContentType>, DomainError> {
        Ok(self.state.read().await.content_types.clone())
    }

    async fn find_subjects(&self, ids: &[SubjectId]) -> Result<Vec<Subject>, DomainError> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.subjects.get(id).cloned())
            .collect())
    }

    async fn find_course_price(
        &self,
        subject_id: &SubjectId,
        line: &CartLine,
    ) -> Result<Option<Money>, DomainError> {
        Ok(self
            .state
            .read()
            .await
            .course_prices
            .get(&(*subject_id, *line))
            .copied())
    }

    async fn find_session_type(
        &self,
        id: &SessionTypeId,
    ) -> Result<Option<SessionType>, DomainError> {
        Ok(self.state.read().await.session_types.get(id).cloned())
    }
}

#[async_trait]
impl OfferRepository for InMemoryStore {
    async fn find_by_id(&self, id: &OfferId) -> Result<Option<Offer>, DomainError> {
        Ok(self.state.read().await.offers.get(id).cloned())
    }

    async fn find_by_code(&self, code: &OfferCode) -> Result<Option<Offer>, DomainError> {
        Ok(self
            .state
            .read()
            .await
            .offers
            .values()
            .find(|o| &o.code == code)
            .cloned())
    }

    async fn increment_usage(&self, id: &OfferId) -> Result<bool, DomainError> {
        let mut state = self.state.write().await;
        match state.offers.get_mut(id) {
            Some(offer) if !offer.is_exhausted() => {
                offer.current_usage += 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl CartRepository for InMemoryStore {
    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<CartItem>, DomainError> {
        let mut items = self.cart_for(user_id).await;
        items.sort_by_key(|i| i.created_at);
        Ok(items)
    }

    async fn add(&self, item: &CartItem) -> Result<(), DomainError> {
        self.state.write().await.cart.push(item.clone());
        Ok(())
    }

    async fn remove(&self, user_id: &UserId, id: &CartItemId) -> Result<bool, DomainError> {
        let mut state = self.state.write().await;
        let before = state.cart.len();
        state
            .cart
            .retain(|i| !(&i.id == id && &i.user_id == user_id));
        Ok(state.cart.len() < before)
    }
}
