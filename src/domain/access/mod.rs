//! Access module - Who may see which content of which subject.

mod grant_resolver;
mod user_access;

pub use grant_resolver::AccessGrantResolver;
pub use user_access::{AccessKey, UserAccess};
