//! Purchase module - Materialized, paid cart lines.

mod aggregate;
mod status;

pub use aggregate::Purchase;
pub use status::PurchaseStatus;
