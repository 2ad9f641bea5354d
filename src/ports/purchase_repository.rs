//! Purchase repository port (reads and status changes).
//!
//! Inserting purchases happens only through [`PurchaseLedger`], together
//! with the access grants and cart cleanup.
//!
//! [`PurchaseLedger`]: super::PurchaseLedger

use async_trait::async_trait;

use crate::domain::foundation::DomainError;

#[async_trait]
pub trait PurchaseRepository: Send + Sync {
    /// True if any purchase row references the checkout session.
    async fn exists_for_session(&self, stripe_session_id: &str) -> Result<bool, DomainError>;

    /// Marks every purchase with this payment intent as failed.
    ///
    /// Returns the number of rows changed. Access grants are left alone.
    async fn mark_failed_by_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> Result<u64, DomainError>;
}
