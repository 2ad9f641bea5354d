//! Discount allocation across cart items.
//!
//! Percentage offers discount each applicable item independently. Fixed
//! offers spread one amount across applicable items in proportion to their
//! price, with the rounding remainder landing on the last item so the
//! shares add up exactly. Every item's discount is capped at its own price,
//! which bounds the total by the cart subtotal.

use std::collections::HashMap;

use rust_decimal::Decimal;

use super::{Discount, Offer};
use crate::domain::cart::{subtotal, CartItem};
use crate::domain::foundation::{round_cents, CartItemId, Money};

/// Discount applied to one cart item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemDiscount {
    pub cart_item_id: CartItemId,
    pub price: Money,
    pub discount: Money,
}

impl ItemDiscount {
    /// What the shopper pays for this item.
    pub fn final_price(&self) -> Money {
        self.price - self.discount
    }
}

/// Per-item discounts for a cart, in cart order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscountAllocation {
    items: Vec<ItemDiscount>,
    total: Money,
    subtotal: Money,
}

impl DiscountAllocation {
    /// An allocation with no discount on any item.
    pub fn none(items: &[CartItem]) -> Self {
        Self {
            items: items
                .iter()
                .map(|item| ItemDiscount {
                    cart_item_id: item.id,
                    price: item.price,
                    discount: Money::ZERO,
                })
                .collect(),
            total: Money::ZERO,
            subtotal: subtotal(items),
        }
    }

    /// Applies a redeemable offer to the cart.
    ///
    /// Redemption checks (code, window, usage) are the caller's job; this
    /// only does the arithmetic.
    pub fn compute(offer: &Offer, items: &[CartItem]) -> Self {
        let applicable: Vec<bool> = items.iter().map(|item| offer.applies_to(item)).collect();

        let raw: Vec<Decimal> = match offer.discount {
            Discount::Percentage(percent) => items
                .iter()
                .zip(&applicable)
                .map(|(item, applies)| {
                    if *applies {
                        round_cents(item.price.amount() * percent / Decimal::ONE_HUNDRED)
                    } else {
                        Decimal::ZERO
                    }
                })
                .collect(),
            Discount::Fixed(amount) => {
                let weights: Vec<Decimal> = items
                    .iter()
                    .zip(&applicable)
                    .map(|(item, applies)| {
                        if *applies {
                            item.price.amount()
                        } else {
                            Decimal::ZERO
                        }
                    })
                    .collect();
                distribute(amount.amount(), &weights)
            }
        };

        Self::from_raw(items, &raw)
    }

    /// Builds the allocation, clamping each item to `[0, price]`.
    fn from_raw(items: &[CartItem], raw: &[Decimal]) -> Self {
        let discounts: Vec<ItemDiscount> = items
            .iter()
            .zip(raw)
            .map(|(item, amount)| {
                let clamped = (*amount).max(Decimal::ZERO).min(item.price.amount());
                ItemDiscount {
                    cart_item_id: item.id,
                    price: item.price,
                    discount: Money::try_new(clamped).unwrap_or(Money::ZERO),
                }
            })
            .collect();

        let total = discounts.iter().map(|d| d.discount).sum();
        Self {
            items: discounts,
            total,
            subtotal: subtotal(items),
        }
    }

    pub fn items(&self) -> &[ItemDiscount] {
        &self.items
    }

    /// Discount for a given item; zero for unknown ids.
    pub fn discount_for(&self, cart_item_id: CartItemId) -> Money {
        self.items
            .iter()
            .find(|d| d.cart_item_id == cart_item_id)
            .map_or(Money::ZERO, |d| d.discount)
    }

    /// Map from cart item id to discount amount.
    pub fn per_item(&self) -> HashMap<CartItemId, Money> {
        self.items
            .iter()
            .map(|d| (d.cart_item_id, d.discount))
            .collect()
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn subtotal(&self) -> Money {
        self.subtotal
    }

    /// Subtotal minus total discount.
    pub fn amount_due(&self) -> Money {
        self.subtotal - self.total
    }

    pub fn has_discount(&self) -> bool {
        !self.total.is_zero()
    }
}

/// Splits `total` across `weights` proportionally, rounding to cents.
///
/// The last weighted entry takes the remainder so the parts sum to `total`.
/// A zero weight sum yields all zeros.
fn distribute(total: Decimal, weights: &[Decimal]) -> Vec<Decimal> {
    let denom: Decimal = weights.iter().copied().sum();
    if denom.is_zero() {
        return vec![Decimal::ZERO; weights.len()];
    }

    let last_weighted = weights.iter().rposition(|w| !w.is_zero());
    let mut remaining = total;

    weights
        .iter()
        .enumerate()
        .map(|(i, weight)| {
            if weight.is_zero() {
                Decimal::ZERO
            } else if Some(i) == last_weighted {
                remaining.max(Decimal::ZERO)
            } else {
                let share = round_cents(total * *weight / denom);
                remaining -= share;
                share
            }
        })
        .collect()
}
