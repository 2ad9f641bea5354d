//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod access;
pub mod cart;
pub mod checkout;
