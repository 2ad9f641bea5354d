//! PostgreSQL implementation of CartRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use super::{db_error, stored_money, stored_user_id};
use crate::domain::cart::CartItem;
use crate::domain::foundation::{
    CartItemId, ContentTypeId, DomainError, SubjectId, Timestamp, UserId,
};
use crate::ports::CartRepository;

pub struct PostgresCartRepository {
    pool: PgPool,
}

impl PostgresCartRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CartItemRow {
    id: Uuid,
    user_id: String,
    subject_id: Uuid,
    content_type_id: Option<Uuid>,
    is_bundle: bool,
    price: Decimal,
    created_at: DateTime<Utc>,
}

impl TryFrom<CartItemRow> for CartItem {
    type Error = DomainError;

    fn try_from(row: CartItemRow) -> Result<Self, Self::Error> {
        // Rows are trusted as stored; `CartItem::line` settles odd combinations.
        Ok(CartItem {
            id: CartItemId::from_uuid(row.id),
            user_id: stored_user_id(row.user_id)?,
            subject_id: SubjectId::from_uuid(row.subject_id),
            content_type_id: row.content_type_id.map(ContentTypeId::from_uuid),
            is_bundle: row.is_bundle,
            price: stored_money("price", row.price)?,
            created_at: Timestamp::from_datetime(row.created_at),
        })
    }
}

#[async_trait]
impl CartRepository for PostgresCartRepository {
    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<CartItem>, DomainError> {
        let rows: Vec<CartItemRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, subject_id, content_type_id, is_bundle, price, created_at
            FROM cart_items
            WHERE user_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list cart items"))?;

        rows.into_iter().map(CartItem::try_from).collect()
    }

    async fn add(&self, item: &CartItem) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO cart_items (id, user_id, subject_id, content_type_id, is_bundle, price, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(item.id.as_uuid())
        .bind(item.user_id.as_str())
        .bind(item.subject_id.as_uuid())
        .bind(item.content_type_id.map(|c| *c.as_uuid()))
        .bind(item.is_bundle)
        .bind(item.price.amount())
        .bind(item.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to add cart item"))?;

        Ok(())
    }

    async fn remove(&self, user_id: &UserId, id: &CartItemId) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND user_id = $2")
            .bind(id.as_uuid())
            .bind(user_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to remove cart item"))?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn row_with_blank_user_is_rejected() {
        let row = CartItemRow {
            id: Uuid::new_v4(),
            user_id: "  ".to_string(),
            subject_id: Uuid::new_v4(),
            content_type_id: None,
            is_bundle: true,
            price: dec!(10),
            created_at: Utc::now(),
        };
        assert!(CartItem::try_from(row).is_err());
    }

    #[test]
    fn row_converts() {
        let content_type = Uuid::new_v4();
        let row = CartItemRow {
            id: Uuid::new_v4(),
            user_id: "user-1".to_string(),
            subject_id: Uuid::new_v4(),
            content_type_id: Some(content_type),
            is_bundle: false,
            price: dec!(19.99),
            created_at: Utc::now(),
        };
        let item = CartItem::try_from(row).unwrap();
        assert_eq!(item.content_type_id, Some(ContentTypeId::from_uuid(content_type)));
        assert_eq!(item.price.amount(), dec!(19.99));
    }
}
