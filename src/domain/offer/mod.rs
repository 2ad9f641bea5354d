//! Offer module - Promotional codes and discount allocation.
//!
//! An offer is validated against the clock and its usage counter, then
//! applied per cart item. Validation failures never surface to the user:
//! an unusable offer simply means no discount.

mod aggregate;
mod discount;
mod offer_code;

pub use aggregate::{Discount, Offer, OfferRejection};
pub use discount::{DiscountAllocation, ItemDiscount};
pub use offer_code::OfferCode;
