//! Course Checkout - Checkout and payment reconciliation for an online
//! course storefront.
//!
//! Learners put subjects (whole bundles or single content types) in a cart,
//! optionally apply an offer code, and pay on a Stripe hosted page. Paid
//! sessions are reconciled into purchase records and content access grants,
//! either from the signed webhook or from the success-page fallback. Both
//! paths converge on the same idempotent ledger commit.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
