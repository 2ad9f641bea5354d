//! PostgreSQL implementation of BookingRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use super::{db_error, stored_money, stored_user_id};
use crate::domain::booking::{BookingStatus, SessionBooking};
use crate::domain::foundation::{
    BookingId, DomainError, ErrorCode, Money, SessionTypeId, Timestamp,
};
use crate::ports::BookingRepository;

pub struct PostgresBookingRepository {
    pool: PgPool,
}

impl PostgresBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    user_id: Option<String>,
    session_type_id: Uuid,
    status: String,
    stripe_session_id: Option<String>,
    stripe_payment_intent_id: Option<String>,
    amount_paid: Option<Decimal>,
    contact_email: String,
    contact_name: Option<String>,
    scheduled_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for SessionBooking {
    type Error = DomainError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let status = BookingStatus::parse(&row.status).ok_or_else(|| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Invalid booking status: {}", row.status),
            )
        })?;

        Ok(SessionBooking {
            id: BookingId::from_uuid(row.id),
            user_id: row.user_id.map(stored_user_id).transpose()?,
            session_type_id: SessionTypeId::from_uuid(row.session_type_id),
            status,
            stripe_session_id: row.stripe_session_id,
            stripe_payment_intent_id: row.stripe_payment_intent_id,
            amount_paid: row
                .amount_paid
                .map(|a| stored_money("amount_paid", a))
                .transpose()?,
            contact_email: row.contact_email,
            contact_name: row.contact_name,
            scheduled_at: row.scheduled_at.map(Timestamp::from_datetime),
            created_at: Timestamp::from_datetime(row.created_at),
        })
    }
}

#[async_trait]
impl BookingRepository for PostgresBookingRepository {
    async fn insert(&self, booking: &SessionBooking) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO session_bookings (
                id, user_id, session_type_id, status, stripe_session_id, stripe_payment_intent_id,
                amount_paid, contact_email, contact_name, scheduled_at, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(booking.id.as_uuid())
        .bind(booking.user_id.as_ref().map(|u| u.as_str()))
        .bind(booking.session_type_id.as_uuid())
        .bind(booking.status.as_str())
        .bind(&booking.stripe_session_id)
        .bind(&booking.stripe_payment_intent_id)
        .bind(booking.amount_paid.map(|m| m.amount()))
        .bind(&booking.contact_email)
        .bind(&booking.contact_name)
        .bind(booking.scheduled_at.map(|t| t.into_datetime()))
        .bind(booking.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to insert booking"))?;

        Ok(())
    }

    async fn find_by_id(&self, id: &BookingId) -> Result<Option<SessionBooking>, DomainError> {
        let row: Option<BookingRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, session_type_id, status, stripe_session_id, stripe_payment_intent_id,
                   amount_paid, contact_email, contact_name, scheduled_at, created_at
            FROM session_bookings
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to find booking"))?;

        row.map(SessionBooking::try_from).transpose()
    }

    async fn attach_checkout_session(
        &self,
        id: &BookingId,
        stripe_session_id: &str,
    ) -> Result<(), DomainError> {
        let result = sqlx::query("UPDATE session_bookings SET stripe_session_id = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(stripe_session_id)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to attach checkout session"))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(ErrorCode::BookingNotFound, "Booking not found"));
        }
        Ok(())
    }

    async fn confirm_payment(
        &self,
        id: &BookingId,
        payment_intent_id: Option<&str>,
        amount_paid: Money,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE session_bookings
            SET status = 'confirmed',
                stripe_payment_intent_id = $2,
                amount_paid = $3
            WHERE id = $1
              AND NOT (status = 'confirmed' AND amount_paid IS NOT NULL)
              AND status IN ('pending', 'confirmed')
            "#,
        )
        .bind(id.as_uuid())
        .bind(payment_intent_id)
        .bind(amount_paid.amount())
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to confirm booking"))?;

        Ok(result.rows_affected() == 1)
    }
}
