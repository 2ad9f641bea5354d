//! Offer entity.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::OfferCode;
use crate::domain::cart::CartItem;
use crate::domain::foundation::{
    ContentTypeId, Money, OfferId, SubjectId, Timestamp, ValidationError,
};

/// How an offer reduces prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Discount {
    /// Percent off each applicable item (25 means 25%).
    Percentage(Decimal),
    /// A fixed amount spread across applicable items.
    Fixed(Money),
}

impl Discount {
    /// Creates a percentage discount.
    ///
    /// Values above 100 are accepted; allocation clamps each item at its price.
    pub fn percentage(value: Decimal) -> Result<Self, ValidationError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(ValidationError::negative("discount_value", value));
        }
        Ok(Discount::Percentage(value))
    }

    pub fn fixed(amount: Money) -> Self {
        Discount::Fixed(amount)
    }

    /// Storage label: "percentage" or "fixed".
    pub fn kind(&self) -> &'static str {
        match self {
            Discount::Percentage(_) => "percentage",
            Discount::Fixed(_) => "fixed",
        }
    }

    /// Raw configured value.
    pub fn value(&self) -> Decimal {
        match self {
            Discount::Percentage(value) => *value,
            Discount::Fixed(amount) => amount.amount(),
        }
    }
}

/// Why an offer was not applied. Logged, never shown to the shopper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferRejection {
    Inactive,
    CodeMismatch,
    NotYetValid,
    Expired,
    UsageExhausted,
}

impl std::fmt::Display for OfferRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OfferRejection::Inactive => "offer is inactive",
            OfferRejection::CodeMismatch => "code does not match",
            OfferRejection::NotYetValid => "offer is not yet valid",
            OfferRejection::Expired => "offer has expired",
            OfferRejection::UsageExhausted => "offer usage limit reached",
        };
        write!(f, "{}", s)
    }
}

/// A promotional offer.
///
/// `subject_id` and `content_type_id`, when set, restrict which cart items
/// the offer discounts. Absence means "applies to all".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    pub id: OfferId,
    pub code: OfferCode,
    pub discount: Discount,
    pub subject_id: Option<SubjectId>,
    pub content_type_id: Option<ContentTypeId>,
    pub valid_from: Timestamp,
    pub valid_until: Timestamp,
    pub max_usage: Option<u32>,
    pub current_usage: u32,
    pub is_active: bool,
}

impl Offer {
    /// Creates an active, unscoped, unlimited offer.
    pub fn new(
        code: OfferCode,
        discount: Discount,
        valid_from: Timestamp,
        valid_until: Timestamp,
    ) -> Self {
        Self {
            id: OfferId::new(),
            code,
            discount,
            subject_id: None,
            content_type_id: None,
            valid_from,
            valid_until,
            max_usage: None,
            current_usage: 0,
            is_active: true,
        }
    }

    pub fn scoped_to_subject(mut self, subject_id: SubjectId) -> Self {
        self.subject_id = Some(subject_id);
        self
    }

    pub fn scoped_to_content_type(mut self, content_type_id: ContentTypeId) -> Self {
        self.content_type_id = Some(content_type_id);
        self
    }

    pub fn with_max_usage(mut self, max_usage: u32) -> Self {
        self.max_usage = Some(max_usage);
        self
    }

    /// Runs the redemption checks in order: active, code, window, usage.
    pub fn check_redeemable(&self, code: &str, now: Timestamp) -> Result<(), OfferRejection> {
        if !self.is_active {
            return Err(OfferRejection::Inactive);
        }
        if !self.code.matches(code) {
            return Err(OfferRejection::CodeMismatch);
        }
        if now.is_before(&self.valid_from) {
            return Err(OfferRejection::NotYetValid);
        }
        if now.is_after(&self.valid_until) {
            return Err(OfferRejection::Expired);
        }
        if self.is_exhausted() {
            return Err(OfferRejection::UsageExhausted);
        }
        Ok(())
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self.max_usage, Some(max) if self.current_usage >= max)
    }

    /// True when the item falls inside the offer's subject/content scope.
    pub fn applies_to(&self, item: &CartItem) -> bool {
        let subject_ok = self.subject_id.map_or(true, |s| s == item.subject_id);
        let content_ok = self
            .content_type_id
            .map_or(true, |c| item.content_type_id == Some(c));
        subject_ok && content_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserId;
    use rust_decimal_macros::dec;

    fn offer() -> Offer {
        let now = Timestamp::now();
        Offer::new(
            OfferCode::try_new("SAVE10").unwrap(),
            Discount::percentage(dec!(10)).unwrap(),
            now.add_days(-1),
            now.add_days(1),
        )
    }

    fn item(subject_id: SubjectId, content_type_id: Option<ContentTypeId>) -> CartItem {
        let user = UserId::new("u").unwrap();
        let price = Money::try_new(dec!(10)).unwrap();
        match content_type_id {
            Some(ct) => CartItem::single(user, subject_id, ct, price),
            None => CartItem::bundle(user, subject_id, price),
        }
    }

    #[test]
    fn valid_offer_is_redeemable_with_lowercase_code() {
        assert_eq!(offer().check_redeemable("save10", Timestamp::now()), Ok(()));
    }

    #[test]
    fn inactive_offer_is_rejected_first() {
        let mut o = offer();
        o.is_active = false;
        assert_eq!(
            o.check_redeemable("WRONG", Timestamp::now()),
            Err(OfferRejection::Inactive)
        );
    }

    #[test]
    fn wrong_code_is_rejected() {
        assert_eq!(
            offer().check_redeemable("SAVE20", Timestamp::now()),
            Err(OfferRejection::CodeMismatch)
        );
    }

    #[test]
    fn window_bounds_are_enforced() {
        let o = offer();
        assert_eq!(
            o.check_redeemable("SAVE10", o.valid_from.add_secs(-1)),
            Err(OfferRejection::NotYetValid)
        );
        assert_eq!(
            o.check_redeemable("SAVE10", o.valid_until.add_secs(1)),
            Err(OfferRejection::Expired)
        );
        assert_eq!(o.check_redeemable("SAVE10", o.valid_from), Ok(()));
        assert_eq!(o.check_redeemable("SAVE10", o.valid_until), Ok(()));
    }

    #[test]
    fn usage_limit_is_enforced() {
        let mut o = offer().with_max_usage(2);
        o.current_usage = 1;
        assert_eq!(o.check_redeemable("SAVE10", Timestamp::now()), Ok(()));
        o.current_usage = 2;
        assert_eq!(
            o.check_redeemable("SAVE10", Timestamp::now()),
            Err(OfferRejection::UsageExhausted)
        );
    }

    #[test]
    fn unscoped_offer_applies_to_everything() {
        let o = offer();
        assert!(o.applies_to(&item(SubjectId::new(), None)));
        assert!(o.applies_to(&item(SubjectId::new(), Some(ContentTypeId::new()))));
    }

    #[test]
    fn scoped_offer_requires_both_scopes_to_match() {
        let subject = SubjectId::new();
        let ct = ContentTypeId::new();
        let o = offer().scoped_to_subject(subject).scoped_to_content_type(ct);

        assert!(o.applies_to(&item(subject, Some(ct))));
        assert!(!o.applies_to(&item(subject, Some(ContentTypeId::new()))));
        assert!(!o.applies_to(&item(subject, None)));
        assert!(!o.applies_to(&item(SubjectId::new(), Some(ct))));
    }

    #[test]
    fn negative_percentage_is_rejected() {
        assert!(Discount::percentage(dec!(-5)).is_err());
    }
}
