//! RemoveFromCartHandler - Removes one of the caller's cart lines.

use std::sync::Arc;

use crate::domain::checkout::CheckoutError;
use crate::domain::foundation::{CartItemId, UserId};
use crate::ports::CartRepository;

#[derive(Debug, Clone)]
pub struct RemoveFromCartCommand {
    pub user_id: UserId,
    pub cart_item_id: CartItemId,
}

pub struct RemoveFromCartHandler {
    carts: Arc<dyn CartRepository>,
}

impl RemoveFromCartHandler {
    pub fn new(carts: Arc<dyn CartRepository>) -> Self {
        Self { carts }
    }

    /// Removing another user's line looks the same as removing a missing one.
    pub async fn handle(&self, cmd: RemoveFromCartCommand) -> Result<(), CheckoutError> {
        if self.carts.remove(&cmd.user_id, &cmd.cart_item_id).await? {
            Ok(())
        } else {
            Err(CheckoutError::not_found(format!("Cart item {}", cmd.cart_item_id)))
        }
    }
}
