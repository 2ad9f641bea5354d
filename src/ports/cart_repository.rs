//! Cart repository port.
//!
//! Cart rows are only ever cleared wholesale by the purchase ledger, inside
//! the materialization transaction; this port covers the shopper-facing
//! operations.

use async_trait::async_trait;

use crate::domain::cart::CartItem;
use crate::domain::foundation::{CartItemId, DomainError, UserId};

#[async_trait]
pub trait CartRepository: Send + Sync {
    /// All pending items for a user, oldest first.
    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<CartItem>, DomainError>;

    async fn add(&self, item: &CartItem) -> Result<(), DomainError>;

    /// Removes an item if it belongs to `user_id`.
    ///
    /// Returns `false` when no such item exists for that user.
    async fn remove(&self, user_id: &UserId, id: &CartItemId) -> Result<bool, DomainError>;
}
