//! Cart handlers.

mod add_to_cart;
mod get_cart;
mod remove_from_cart;

pub use add_to_cart::{AddToCartCommand, AddToCartHandler};
pub use get_cart::{GetCartHandler, GetCartQuery, GetCartResult};
pub use remove_from_cart::{RemoveFromCartCommand, RemoveFromCartHandler};
