//! CartItem entity.
//!
//! A cart line is either a whole-subject bundle or a single content type
//! within a subject. Lines are not unique per subject; a user may hold
//! several pending lines at once.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    CartItemId, ContentTypeId, Money, SubjectId, Timestamp, UserId, ValidationError,
};

/// What a cart line buys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CartLine {
    /// Every content type of the subject.
    Bundle,
    /// A single content type of the subject.
    Single { content_type_id: ContentTypeId },
}

/// A pending purchase line owned by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub user_id: UserId,
    pub subject_id: SubjectId,
    pub content_type_id: Option<ContentTypeId>,
    pub is_bundle: bool,
    pub price: Money,
    pub created_at: Timestamp,
}

impl CartLine {
    /// Builds the line from the request shape.
    ///
    /// # Errors
    ///
    /// `InvalidFormat` when a bundle carries a content type or a single
    /// line lacks one.
    pub fn from_parts(
        is_bundle: bool,
        content_type_id: Option<ContentTypeId>,
    ) -> Result<Self, ValidationError> {
        match (is_bundle, content_type_id) {
            (true, None) => Ok(CartLine::Bundle),
            (false, Some(content_type_id)) => Ok(CartLine::Single { content_type_id }),
            (true, Some(_)) => Err(ValidationError::invalid_format(
                "content_type_id",
                "bundle items cover every content type",
            )),
            (false, None) => Err(ValidationError::invalid_format(
                "content_type_id",
                "required for non-bundle items",
            )),
        }
    }

    pub fn content_type_id(&self) -> Option<ContentTypeId> {
        match self {
            CartLine::Bundle => None,
            CartLine::Single { content_type_id } => Some(*content_type_id),
        }
    }
}

impl CartItem {
    /// Creates a cart line at the given catalog price.
    pub fn for_line(user_id: UserId, subject_id: SubjectId, line: CartLine, price: Money) -> Self {
        Self {
            id: CartItemId::new(),
            user_id,
            subject_id,
            content_type_id: line.content_type_id(),
            is_bundle: line == CartLine::Bundle,
            price,
            created_at: Timestamp::now(),
        }
    }

    /// Shorthand for a bundle line.
    pub fn bundle(user_id: UserId, subject_id: SubjectId, price: Money) -> Self {
        Self::for_line(user_id, subject_id, CartLine::Bundle, price)
    }

    /// Shorthand for a single content type line.
    pub fn single(
        user_id: UserId,
        subject_id: SubjectId,
        content_type_id: ContentTypeId,
        price: Money,
    ) -> Self {
        Self::for_line(user_id, subject_id, CartLine::Single { content_type_id }, price)
    }

    /// Typed view of what this line buys.
    ///
    /// A stored row that is neither a bundle nor carries a content type
    /// is treated as a bundle, the broader grant.
    pub fn line(&self) -> CartLine {
        match (self.is_bundle, self.content_type_id) {
            (false, Some(content_type_id)) => CartLine::Single { content_type_id },
            _ => CartLine::Bundle,
        }
    }
}

/// Sum of line prices.
pub fn subtotal(items: &[CartItem]) -> Money {
    items.iter().map(|item| item.price).sum()
}
