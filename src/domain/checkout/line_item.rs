//! Provider line items built from cart lines.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Money;
use crate::domain::offer::OfferCode;

/// One priced line on the hosted checkout page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutLineItem {
    pub name: String,
    pub description: Option<String>,
    /// Charge after discount, never negative.
    pub unit_amount: Money,
    pub quantity: u32,
}

impl CheckoutLineItem {
    pub fn new(name: impl Into<String>, description: Option<String>, unit_amount: Money) -> Self {
        Self {
            name: name.into(),
            description,
            unit_amount,
            quantity: 1,
        }
    }
}

/// `"{subject} - Complete Bundle"` for bundles, `"{subject} - {content type}"` otherwise.
pub fn line_item_name(subject_title: &str, content_type_name: Option<&str>) -> String {
    match content_type_name {
        Some(name) => format!("{} - {}", subject_title, name),
        None => format!("{} - Complete Bundle", subject_title),
    }
}

/// Base description, with the discount code and amount appended when one applies.
pub fn line_item_description(
    base: Option<&str>,
    code: Option<&OfferCode>,
    discount: Money,
) -> Option<String> {
    let note = match code {
        Some(code) if !discount.is_zero() => {
            Some(format!("Discount code {} applied: -{}", code, discount))
        }
        _ => None,
    };

    match (base, note) {
        (Some(base), Some(note)) => Some(format!("{} ({})", base, note)),
        (Some(base), None) => Some(base.to_string()),
        (None, note) => note,
    }
}
