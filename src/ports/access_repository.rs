//! User access repository port (read side).
//!
//! Grants are written by the purchase ledger; content gating reads here.

use async_trait::async_trait;

use crate::domain::access::UserAccess;
use crate::domain::foundation::{ContentTypeId, DomainError, SubjectId, UserId};

#[async_trait]
pub trait UserAccessRepository: Send + Sync {
    async fn has_access(
        &self,
        user_id: &UserId,
        subject_id: &SubjectId,
        content_type_id: &ContentTypeId,
    ) -> Result<bool, DomainError>;

    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<UserAccess>, DomainError>;
}
