//! UserAccess entity.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ContentTypeId, SubjectId, Timestamp, UserId};

/// Composite identity of an access row. Unique in storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccessKey {
    pub user_id: UserId,
    pub subject_id: SubjectId,
    pub content_type_id: ContentTypeId,
}

/// Permission for a user to view one content type of one subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccess {
    pub user_id: UserId,
    pub subject_id: SubjectId,
    pub content_type_id: ContentTypeId,
    pub granted_at: Timestamp,
}

impl UserAccess {
    pub fn new(user_id: UserId, subject_id: SubjectId, content_type_id: ContentTypeId) -> Self {
        Self {
            user_id,
            subject_id,
            content_type_id,
            granted_at: Timestamp::now(),
        }
    }

    pub fn key(&self) -> AccessKey {
        AccessKey {
            user_id: self.user_id.clone(),
            subject_id: self.subject_id,
            content_type_id: self.content_type_id,
        }
    }
}
