//! Purchase entity.
//!
//! One row per cart line per paid checkout session. The pair
//! `(stripe_session_id, cart_item_id)` is unique, which is what makes
//! materialization safe to repeat.

use serde::{Deserialize, Serialize};

use super::PurchaseStatus;
use crate::domain::cart::CartItem;
use crate::domain::foundation::{
    CartItemId, ContentTypeId, Money, PurchaseId, StateMachine, SubjectId, Timestamp, UserId,
    ValidationError,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    pub id: PurchaseId,
    pub user_id: UserId,
    pub subject_id: SubjectId,
    /// `None` for bundle purchases.
    pub content_type_id: Option<ContentTypeId>,
    pub is_bundle: bool,
    pub amount: Money,
    pub status: PurchaseStatus,
    pub transaction_id: Option<String>,
    pub stripe_session_id: String,
    pub stripe_payment_intent_id: Option<String>,
    pub cart_item_id: CartItemId,
    pub created_at: Timestamp,
}

impl Purchase {
    /// A paid purchase materialized from a cart line.
    ///
    /// `amount` is what was charged for the line, after discount.
    pub fn paid_from_cart_item(
        item: &CartItem,
        amount: Money,
        stripe_session_id: impl Into<String>,
        payment_intent_id: Option<String>,
    ) -> Self {
        Self {
            id: PurchaseId::new(),
            user_id: item.user_id.clone(),
            subject_id: item.subject_id,
            content_type_id: if item.is_bundle {
                None
            } else {
                item.content_type_id
            },
            is_bundle: item.is_bundle,
            amount,
            status: PurchaseStatus::Paid,
            transaction_id: payment_intent_id.clone(),
            stripe_session_id: stripe_session_id.into(),
            stripe_payment_intent_id: payment_intent_id,
            cart_item_id: item.id,
            created_at: Timestamp::now(),
        }
    }

    /// Marks the purchase failed.
    pub fn mark_failed(&mut self) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(PurchaseStatus::Failed)?;
        Ok(())
    }
}
