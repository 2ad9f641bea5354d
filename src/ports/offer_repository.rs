//! Offer repository port.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, OfferId};
use crate::domain::offer::{Offer, OfferCode};

#[async_trait]
pub trait OfferRepository: Send + Sync {
    async fn find_by_id(&self, id: &OfferId) -> Result<Option<Offer>, DomainError>;

    /// Looks up by normalized (uppercase) code.
    async fn find_by_code(&self, code: &OfferCode) -> Result<Option<Offer>, DomainError>;

    /// Increments `current_usage` by one as a single conditional update.
    ///
    /// Returns `false` without changing anything when the offer is missing
    /// or already at `max_usage`.
    async fn increment_usage(&self, id: &OfferId) -> Result<bool, DomainError>;
}
