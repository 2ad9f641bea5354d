//! Purchase ledger, purchase and access ports over the in-memory store.

use std::collections::HashSet;

use async_trait::async_trait;

use super::InMemoryStore;
use crate::domain::access::{AccessKey, UserAccess};
use crate::domain::foundation::{ContentTypeId, DomainError, SubjectId, UserId};
use crate::domain::purchase::{Purchase, PurchaseStatus};
use crate::ports::{
    LedgerOutcome, PurchaseLedger, PurchasePlan, PurchaseRepository, UserAccessRepository,
};

#[async_trait]
impl PurchaseLedger for InMemoryStore {
    async fn commit(&self, plan: &PurchasePlan) -> Result<LedgerOutcome, DomainError> {
        self.check_writable()?;
        // One write guard for the whole commit stands in for the transaction.
        let mut state = self.state.write().await;

        let taken: HashSet<(String, _)> = state
            .purchases
            .iter()
            .map(|p| (p.stripe_session_id.clone(), p.cart_item_id))
            .collect();
        let fresh: Vec<Purchase> = plan
            .purchases
            .iter()
            .filter(|p| !taken.contains(&(p.stripe_session_id.clone(), p.cart_item_id)))
            .cloned()
            .collect();

        if fresh.is_empty() {
            return Ok(LedgerOutcome::default());
        }

        let mut existing: HashSet<AccessKey> = state.access.iter().map(UserAccess::key).collect();
        let mut access_granted = 0;
        for grant in &plan.grants {
            if existing.insert(grant.key()) {
                state.access.push(grant.clone());
                access_granted += 1;
            }
        }

        let purchases_inserted = fresh.len() as u64;
        state.purchases.extend(fresh);
        state.cart.retain(|i| i.user_id != plan.user_id);

        Ok(LedgerOutcome {
            purchases_inserted,
            access_granted,
        })
    }
}

#[async_trait]
impl PurchaseRepository for InMemoryStore {
    async fn exists_for_session(&self, stripe_session_id: &str) -> Result<bool, DomainError> {
        Ok(self
            .state
            .read()
            .await
            .purchases
            .iter()
            .any(|p| p.stripe_session_id == stripe_session_id))
    }

    async fn mark_failed_by_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> Result<u64, DomainError> {
        self.check_writable()?;
        let mut state = self.state.write().await;
        let mut changed = 0;
        for purchase in state.purchases.iter_mut().filter(|p| {
            p.stripe_payment_intent_id.as_deref() == Some(payment_intent_id)
                && p.status != PurchaseStatus::Failed
        }) {
            purchase.mark_failed()?;
            changed += 1;
        }
        Ok(changed)
    }
}

#[async_trait]
impl UserAccessRepository for InMemoryStore {
    async fn has_access(
        &self,
        user_id: &UserId,
        subject_id: &SubjectId,
        content_type_id: &ContentTypeId,
    ) -> Result<bool, DomainError> {
        Ok(self.state.read().await.access.iter().any(|a| {
            &a.user_id == user_id
                && &a.subject_id == subject_id
                && &a.content_type_id == content_type_id
        }))
    }

    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<UserAccess>, DomainError> {
        Ok(self.access_for(user_id).await)
    }
}
