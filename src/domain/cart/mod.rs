//! Cart module - Pending line items a user intends to buy.

mod cart_item;

pub use cart_item::{subtotal, CartItem, CartLine};
