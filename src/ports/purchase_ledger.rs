//! Purchase ledger port - Atomic materialization of a paid cart.
//!
//! A commit runs in one transaction:
//!
//! 1. insert purchases, skipping `(stripe_session_id, cart_item_id)` conflicts
//! 2. insert access grants, skipping `(user_id, subject_id, content_type_id)` conflicts
//! 3. delete every cart row of the user
//!
//! If step 1 inserts nothing, another run already materialized the session;
//! the transaction is rolled back and the outcome reports zero purchases.

use async_trait::async_trait;

use crate::domain::access::UserAccess;
use crate::domain::foundation::{DomainError, UserId};
use crate::domain::purchase::Purchase;

/// Everything one reconciliation writes.
#[derive(Debug, Clone)]
pub struct PurchasePlan {
    pub user_id: UserId,
    pub purchases: Vec<Purchase>,
    pub grants: Vec<UserAccess>,
}

/// Rows actually written by a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LedgerOutcome {
    pub purchases_inserted: u64,
    pub access_granted: u64,
}

impl LedgerOutcome {
    /// True when a concurrent or earlier run had already written the session.
    pub fn lost_race(&self) -> bool {
        self.purchases_inserted == 0
    }
}

#[async_trait]
pub trait PurchaseLedger: Send + Sync {
    async fn commit(&self, plan: &PurchasePlan) -> Result<LedgerOutcome, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn purchase_ledger_is_object_safe() {
        fn _accepts_dyn(_ledger: &dyn PurchaseLedger) {}
    }

    #[test]
    fn zero_inserted_purchases_is_a_lost_race() {
        assert!(LedgerOutcome::default().lost_race());
        let won = LedgerOutcome {
            purchases_inserted: 2,
            access_granted: 0,
        };
        assert!(!won.lost_race());
    }
}
