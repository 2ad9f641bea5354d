//! PostgreSQL purchase ledger plus the purchase and access read ports.
//!
//! The ledger commit is the single write path for a paid cart. Its
//! idempotence rests on two constraints from `migrations/`:
//! `purchases_session_item_key` and the `user_access` primary key.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{db_error, stored_user_id};
use crate::domain::access::UserAccess;
use crate::domain::foundation::{ContentTypeId, DomainError, SubjectId, Timestamp, UserId};
use crate::domain::purchase::PurchaseStatus;
use crate::ports::{
    LedgerOutcome, PurchaseLedger, PurchasePlan, PurchaseRepository, UserAccessRepository,
};

// ════════════════════════════════════════════════════════════════════════════════
// Ledger
// ════════════════════════════════════════════════════════════════════════════════

pub struct PostgresPurchaseLedger {
    pool: PgPool,
}

impl PostgresPurchaseLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PurchaseLedger for PostgresPurchaseLedger {
    async fn commit(&self, plan: &PurchasePlan) -> Result<LedgerOutcome, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin ledger transaction"))?;

        let mut purchases_inserted = 0;
        for purchase in &plan.purchases {
            let result = sqlx::query(
                r#"
                INSERT INTO purchases (
                    id, user_id, subject_id, content_type_id, is_bundle, amount, status,
                    transaction_id, stripe_session_id, stripe_payment_intent_id, cart_item_id, created_at
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                ON CONFLICT (stripe_session_id, cart_item_id) DO NOTHING
                "#,
            )
            .bind(purchase.id.as_uuid())
            .bind(purchase.user_id.as_str())
            .bind(purchase.subject_id.as_uuid())
            .bind(purchase.content_type_id.map(|c| *c.as_uuid()))
            .bind(purchase.is_bundle)
            .bind(purchase.amount.amount())
            .bind(purchase.status.as_str())
            .bind(&purchase.transaction_id)
            .bind(&purchase.stripe_session_id)
            .bind(&purchase.stripe_payment_intent_id)
            .bind(purchase.cart_item_id.as_uuid())
            .bind(purchase.created_at.as_datetime())
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to insert purchase"))?;
            purchases_inserted += result.rows_affected();
        }

        if purchases_inserted == 0 {
            tx.rollback()
                .await
                .map_err(db_error("Failed to roll back ledger transaction"))?;
            return Ok(LedgerOutcome::default());
        }

        let mut access_granted = 0;
        for grant in &plan.grants {
            let result = sqlx::query(
                r#"
                INSERT INTO user_access (user_id, subject_id, content_type_id, granted_at)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (user_id, subject_id, content_type_id) DO NOTHING
                "#,
            )
            .bind(grant.user_id.as_str())
            .bind(grant.subject_id.as_uuid())
            .bind(grant.content_type_id.as_uuid())
            .bind(grant.granted_at.as_datetime())
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to grant access"))?;
            access_granted += result.rows_affected();
        }

        sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(plan.user_id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to clear cart"))?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit ledger transaction"))?;

        Ok(LedgerOutcome {
            purchases_inserted,
            access_granted,
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Purchases
// ════════════════════════════════════════════════════════════════════════════════

pub struct PostgresPurchaseRepository {
    pool: PgPool,
}

impl PostgresPurchaseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PurchaseRepository for PostgresPurchaseRepository {
    async fn exists_for_session(&self, stripe_session_id: &str) -> Result<bool, DomainError> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM purchases WHERE stripe_session_id = $1)")
                .bind(stripe_session_id)
                .fetch_one(&self.pool)
                .await
                .map_err(db_error("Failed to check purchases"))?;
        Ok(exists)
    }

    async fn mark_failed_by_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> Result<u64, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE purchases
            SET status = $2
            WHERE stripe_payment_intent_id = $1 AND status <> $2
            "#,
        )
        .bind(payment_intent_id)
        .bind(PurchaseStatus::Failed.as_str())
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to mark purchases failed"))?;

        Ok(result.rows_affected())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Access
// ════════════════════════════════════════════════════════════════════════════════

pub struct PostgresUserAccessRepository {
    pool: PgPool,
}

impl PostgresUserAccessRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserAccessRow {
    user_id: String,
    subject_id: Uuid,
    content_type_id: Uuid,
    granted_at: DateTime<Utc>,
}

impl TryFrom<UserAccessRow> for UserAccess {
    type Error = DomainError;

    fn try_from(row: UserAccessRow) -> Result<Self, Self::Error> {
        Ok(UserAccess {
            user_id: stored_user_id(row.user_id)?,
            subject_id: SubjectId::from_uuid(row.subject_id),
            content_type_id: ContentTypeId::from_uuid(row.content_type_id),
            granted_at: Timestamp::from_datetime(row.granted_at),
        })
    }
}

#[async_trait]
impl UserAccessRepository for PostgresUserAccessRepository {
    async fn has_access(
        &self,
        user_id: &UserId,
        subject_id: &SubjectId,
        content_type_id: &ContentTypeId,
    ) -> Result<bool, DomainError> {
        let (exists,): (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM user_access
                WHERE user_id = $1 AND subject_id = $2 AND content_type_id = $3
            )
            "#,
        )
        .bind(user_id.as_str())
        .bind(subject_id.as_uuid())
        .bind(content_type_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to check access"))?;

        Ok(exists)
    }

    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<UserAccess>, DomainError> {
        let rows: Vec<UserAccessRow> = sqlx::query_as(
            r#"
            SELECT user_id, subject_id, content_type_id, granted_at
            FROM user_access
            WHERE user_id = $1
            ORDER BY granted_at
            "#,
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list access"))?;

        rows.into_iter().map(UserAccess::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_row_converts() {
        let subject = Uuid::new_v4();
        let row = UserAccessRow {
            user_id: "user-1".to_string(),
            subject_id: subject,
            content_type_id: Uuid::new_v4(),
            granted_at: Utc::now(),
        };

        let access = UserAccess::try_from(row).unwrap();

        assert_eq!(access.user_id.as_str(), "user-1");
        assert_eq!(access.subject_id, SubjectId::from_uuid(subject));
    }

    #[test]
    fn blank_stored_user_is_rejected() {
        let row = UserAccessRow {
            user_id: "   ".to_string(),
            subject_id: Uuid::new_v4(),
            content_type_id: Uuid::new_v4(),
            granted_at: Utc::now(),
        };
        assert!(UserAccess::try_from(row).is_err());
    }
}
