//! ListAccessHandler - What the caller has unlocked.

use std::sync::Arc;

use crate::domain::access::UserAccess;
use crate::domain::checkout::CheckoutError;
use crate::domain::foundation::UserId;
use crate::ports::UserAccessRepository;

#[derive(Debug, Clone)]
pub struct ListAccessQuery {
    pub user_id: UserId,
}

pub struct ListAccessHandler {
    access: Arc<dyn UserAccessRepository>,
}

impl ListAccessHandler {
    pub fn new(access: Arc<dyn UserAccessRepository>) -> Self {
        Self { access }
    }

    pub async fn handle(&self, query: ListAccessQuery) -> Result<Vec<UserAccess>, CheckoutError> {
        Ok(self.access.list_for_user(&query.user_id).await?)
    }
}
