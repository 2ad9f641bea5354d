//! GetCartHandler - Lists the caller's cart with its subtotal.

use std::sync::Arc;

use crate::domain::cart::{subtotal, CartItem};
use crate::domain::checkout::CheckoutError;
use crate::domain::foundation::{Money, UserId};
use crate::ports::CartRepository;

#[derive(Debug, Clone)]
pub struct GetCartQuery {
    pub user_id: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetCartResult {
    pub items: Vec<CartItem>,
    pub subtotal: Money,
}

pub struct GetCartHandler {
    carts: Arc<dyn CartRepository>,
}

impl GetCartHandler {
    pub fn new(carts: Arc<dyn CartRepository>) -> Self {
        Self { carts }
    }

    pub async fn handle(&self, query: GetCartQuery) -> Result<GetCartResult, CheckoutError> {
        let items = self.carts.list_for_user(&query.user_id).await?;
        Ok(GetCartResult {
            subtotal: subtotal(&items),
            items,
        })
    }
}
