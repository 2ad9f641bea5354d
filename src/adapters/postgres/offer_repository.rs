//! PostgreSQL implementation of OfferRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use super::{db_error, stored_money};
use crate::domain::foundation::{
    ContentTypeId, DomainError, ErrorCode, OfferId, SubjectId, Timestamp,
};
use crate::domain::offer::{Discount, Offer, OfferCode};
use crate::ports::OfferRepository;

pub struct PostgresOfferRepository {
    pool: PgPool,
}

impl PostgresOfferRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const OFFER_COLUMNS: &str = "id, code, discount_type, discount_value, subject_id, content_type_id, \
     valid_from, valid_until, max_usage, current_usage, is_active";

#[derive(Debug, sqlx::FromRow)]
struct OfferRow {
    id: Uuid,
    code: String,
    discount_type: String,
    discount_value: Decimal,
    subject_id: Option<Uuid>,
    content_type_id: Option<Uuid>,
    valid_from: DateTime<Utc>,
    valid_until: DateTime<Utc>,
    max_usage: Option<i32>,
    current_usage: i32,
    is_active: bool,
}

impl TryFrom<OfferRow> for Offer {
    type Error = DomainError;

    fn try_from(row: OfferRow) -> Result<Self, Self::Error> {
        let corrupt = |what: &str| {
            DomainError::new(ErrorCode::DatabaseError, format!("Invalid stored offer {}", what))
        };

        let discount = match row.discount_type.as_str() {
            "percentage" => {
                Discount::percentage(row.discount_value).map_err(|_| corrupt("discount_value"))?
            }
            "fixed" => Discount::fixed(stored_money("discount_value", row.discount_value)?),
            _ => return Err(corrupt("discount_type")),
        };

        Ok(Offer {
            id: OfferId::from_uuid(row.id),
            code: OfferCode::try_new(&row.code).map_err(|_| corrupt("code"))?,
            discount,
            subject_id: row.subject_id.map(SubjectId::from_uuid),
            content_type_id: row.content_type_id.map(ContentTypeId::from_uuid),
            valid_from: Timestamp::from_datetime(row.valid_from),
            valid_until: Timestamp::from_datetime(row.valid_until),
            max_usage: row.max_usage.map(|m| m.max(0) as u32),
            current_usage: row.current_usage.max(0) as u32,
            is_active: row.is_active,
        })
    }
}

#[async_trait]
impl OfferRepository for PostgresOfferRepository {
    async fn find_by_id(&self, id: &OfferId) -> Result<Option<Offer>, DomainError> {
        let row: Option<OfferRow> =
            sqlx::query_as(&format!("SELECT {} FROM offers WHERE id = $1", OFFER_COLUMNS))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error("Failed to find offer"))?;

        row.map(Offer::try_from).transpose()
    }

    async fn find_by_code(&self, code: &OfferCode) -> Result<Option<Offer>, DomainError> {
        let row: Option<OfferRow> = sqlx::query_as(&format!(
            "SELECT {} FROM offers WHERE UPPER(code) = $1",
            OFFER_COLUMNS
        ))
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to find offer by code"))?;

        row.map(Offer::try_from).transpose()
    }

    async fn increment_usage(&self, id: &OfferId) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE offers
            SET current_usage = current_usage + 1
            WHERE id = $1
              AND (max_usage IS NULL OR current_usage < max_usage)
            "#,
        )
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to increment offer usage"))?;

        Ok(result.rows_affected() == 1)
    }
}
