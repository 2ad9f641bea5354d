//! In-memory adapters.
//!
//! One [`InMemoryStore`] implements every storage port against shared
//! state, so a test (or a local run without Postgres) can wire the whole
//! checkout flow to a single value. The ledger honours the same uniqueness
//! rules as the SQL schema.

mod bookings;
mod catalog;
mod ledger;
mod store;
mod webhook_events;

pub use store::InMemoryStore;
