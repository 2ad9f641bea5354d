//! AddToCartHandler - Adds a line to the caller's cart.
//!
//! The line is priced from the catalog; clients only say what they want.

use std::sync::Arc;

use crate::domain::cart::{CartItem, CartLine};
use crate::domain::checkout::CheckoutError;
use crate::domain::foundation::{ContentTypeId, SubjectId, UserId};
use crate::ports::{CartRepository, CatalogReader, UserAccessRepository};

#[derive(Debug, Clone)]
pub struct AddToCartCommand {
    pub user_id: UserId,
    pub subject_id: SubjectId,
    pub content_type_id: Option<ContentTypeId>,
    pub is_bundle: bool,
}

pub struct AddToCartHandler {
    carts: Arc<dyn CartRepository>,
    access: Arc<dyn UserAccessRepository>,
    catalog: Arc<dyn CatalogReader>,
}

impl AddToCartHandler {
    pub fn new(
        carts: Arc<dyn CartRepository>,
        access: Arc<dyn UserAccessRepository>,
        catalog: Arc<dyn CatalogReader>,
    ) -> Self {
        Self {
            carts,
            access,
            catalog,
        }
    }

    pub async fn handle(&self, cmd: AddToCartCommand) -> Result<CartItem, CheckoutError> {
        let line = CartLine::from_parts(cmd.is_bundle, cmd.content_type_id)?;

        let price = self
            .catalog
            .find_course_price(&cmd.subject_id, &line)
            .await?
            .ok_or_else(|| {
                CheckoutError::not_found(match line {
                    CartLine::Bundle => format!("Bundle for subject {}", cmd.subject_id),
                    CartLine::Single { content_type_id } => format!(
                        "Content type {} for subject {}",
                        content_type_id, cmd.subject_id
                    ),
                })
            })?;

        if let CartLine::Single { content_type_id } = line {
            if self
                .access
                .has_access(&cmd.user_id, &cmd.subject_id, &content_type_id)
                .await?
            {
                return Err(CheckoutError::Validation(
                    "content is already unlocked".to_string(),
                ));
            }
        }

        let existing = self.carts.list_for_user(&cmd.user_id).await?;
        if existing.iter().any(|i| i.line() == line && i.subject_id == cmd.subject_id) {
            return Err(CheckoutError::Validation("item is already in the cart".to_string()));
        }

        let item = CartItem::for_line(cmd.user_id, cmd.subject_id, line, price);
        self.carts.add(&item).await?;
        tracing::debug!(user_id = %item.user_id, cart_item_id = %item.id, price = %item.price, "Cart item added");
        Ok(item)
    }
}
