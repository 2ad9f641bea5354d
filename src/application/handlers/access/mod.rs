//! Access handlers.

mod list_access;

pub use list_access::{ListAccessHandler, ListAccessQuery};
