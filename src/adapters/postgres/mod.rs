//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! This module provides adapters for PostgreSQL-backed persistence:
//! - `PostgresCatalogReader` - Subjects, content types, session types
//! - `PostgresOfferRepository` - Offer lookup and usage counting
//! - `PostgresCartRepository` - Pending cart lines
//! - `PostgresPurchaseLedger` - Transactional purchase materialization
//! - `PostgresPurchaseRepository` / `PostgresUserAccessRepository` - Reads and failure marking
//! - `PostgresBookingRepository` - 1:1 session bookings
//! - `PostgresWebhookEventRepository` - Stripe event deduplication
//!
//! Schema lives in `migrations/`; `run_migrations` applies it.

mod booking_repository;
mod cart_repository;
mod catalog_reader;
mod offer_repository;
mod purchase_ledger;
mod webhook_event_repository;

pub use booking_repository::PostgresBookingRepository;
pub use cart_repository::PostgresCartRepository;
pub use catalog_reader::PostgresCatalogReader;
pub use offer_repository::PostgresOfferRepository;
pub use purchase_ledger::{
    PostgresPurchaseLedger, PostgresPurchaseRepository, PostgresUserAccessRepository,
};
pub use webhook_event_repository::PostgresWebhookEventRepository;

use sqlx::PgPool;

use crate::domain::foundation::{DomainError, ErrorCode, UserId};

/// Applies the embedded migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), DomainError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to run migrations: {}", e)))
}

/// Wraps a sqlx error with the failed operation.
pub(crate) fn db_error(context: &'static str) -> impl Fn(sqlx::Error) -> DomainError {
    move |e| DomainError::database(format!("{}: {}", context, e))
}

/// Rebuilds a stored user id; blanks mean a corrupt row.
pub(crate) fn stored_user_id(raw: String) -> Result<UserId, DomainError> {
    UserId::new(raw).map_err(|e| {
        DomainError::new(ErrorCode::DatabaseError, format!("Invalid stored user_id: {}", e))
    })
}

/// Rebuilds a stored amount; negatives mean a corrupt row.
pub(crate) fn stored_money(
    field: &'static str,
    raw: rust_decimal::Decimal,
) -> Result<crate::domain::foundation::Money, DomainError> {
    crate::domain::foundation::Money::try_new(raw).map_err(|e| {
        DomainError::new(ErrorCode::DatabaseError, format!("Invalid stored {}: {}", field, e))
    })
}
