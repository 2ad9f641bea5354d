//! PostgreSQL implementation of CatalogReader.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use super::{db_error, stored_money};
use crate::domain::cart::CartLine;
use crate::domain::catalog::{ContentType, SessionType, Subject};
use crate::domain::foundation::{
    ContentTypeId, DomainError, ErrorCode, Money, SessionTypeId, SubjectId,
};
use crate::ports::CatalogReader;

pub struct PostgresCatalogReader {
    pool: PgPool,
}

impl PostgresCatalogReader {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SessionTypeRow {
    id: Uuid,
    name: String,
    price: Decimal,
    duration_minutes: i32,
}

impl TryFrom<SessionTypeRow> for SessionType {
    type Error = DomainError;

    fn try_from(row: SessionTypeRow) -> Result<Self, Self::Error> {
        let duration_minutes = u32::try_from(row.duration_minutes).map_err(|_| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Invalid duration_minutes: {}", row.duration_minutes),
            )
        })?;
        Ok(SessionType {
            id: SessionTypeId::from_uuid(row.id),
            name: row.name,
            price: stored_money("price", row.price)?,
            duration_minutes,
        })
    }
}

#[async_trait]
impl CatalogReader for PostgresCatalogReader {
    async fn list_content_types(&self) -> Result<Vec<ContentType>, DomainError> {
        let rows: Vec<(Uuid, String)> =
            sqlx::query_as("SELECT id, name FROM content_types ORDER BY name")
                .fetch_all(&self.pool)
                .await
                .map_err(db_error("Failed to list content types"))?;

        Ok(rows
            .into_iter()
            .map(|(id, name)| ContentType::new(ContentTypeId::from_uuid(id), name))
            .collect())
    }

    async fn find_subjects(&self, ids: &[SubjectId]) -> Result<Vec<Subject>, DomainError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let uuids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();

        let rows: Vec<(Uuid, String)> =
            sqlx::query_as("SELECT id, title FROM subjects WHERE id = ANY($1)")
                .bind(&uuids)
                .fetch_all(&self.pool)
                .await
                .map_err(db_error("Failed to load subjects"))?;

        Ok(rows
            .into_iter()
            .map(|(id, title)| Subject::new(SubjectId::from_uuid(id), title))
            .collect())
    }

    async fn find_course_price(
        &self,
        subject_id: &SubjectId,
        line: &CartLine,
    ) -> Result<Option<Money>, DomainError> {
        // A subject without a bundle price is not sold as a bundle.
        let price: Option<Decimal> = match line {
            CartLine::Bundle => sqlx::query_scalar::<_, Option<Decimal>>(
                "SELECT bundle_price FROM subjects WHERE id = $1",
            )
            .bind(subject_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to load bundle price"))?
            .flatten(),
            CartLine::Single { content_type_id } => sqlx::query_scalar(
                r#"
                SELECT price FROM subject_content_prices
                WHERE subject_id = $1 AND content_type_id = $2
                "#,
            )
            .bind(subject_id.as_uuid())
            .bind(content_type_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to load content price"))?,
        };

        price.map(|raw| stored_money("price", raw)).transpose()
    }

    async fn find_session_type(
        &self,
        id: &SessionTypeId,
    ) -> Result<Option<SessionType>, DomainError> {
        let row: Option<SessionTypeRow> = sqlx::query_as(
            "SELECT id, name, price, duration_minutes FROM session_types WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to find session type"))?;

        row.map(SessionType::try_from).transpose()
    }
}
