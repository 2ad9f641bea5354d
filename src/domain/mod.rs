//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (ids, money, timestamps, errors)
//! - `catalog` - Subjects, content types and session types being sold
//! - `cart` - Pending cart lines
//! - `offer` - Promotional offers and discount allocation
//! - `checkout` - Metadata envelope and line items sent to the provider
//! - `purchase` - Materialized purchase records
//! - `access` - Content access grants derived from purchases
//! - `booking` - Paid 1:1 session bookings
//! - `webhook` - Stripe signature verification and event routing

pub mod access;
pub mod booking;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod foundation;
pub mod offer;
pub mod purchase;
pub mod webhook;
