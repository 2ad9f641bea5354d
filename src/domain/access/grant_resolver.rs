//! Access Grant Resolver.
//!
//! Decides the full set of access rows a purchase implies. Persisting them
//! is an "ensure" (insert if absent), so resolving the same purchase again
//! and re-persisting never creates duplicates.

use std::collections::HashSet;

use super::{AccessKey, UserAccess};
use crate::domain::catalog::ContentType;
use crate::domain::purchase::Purchase;

/// Expands purchases into access grants.
#[derive(Debug, Clone, Default)]
pub struct AccessGrantResolver {
    content_types: Vec<ContentType>,
}

impl AccessGrantResolver {
    /// `content_types` is every content type known to the catalog; bundles
    /// expand to all of them.
    pub fn new(content_types: Vec<ContentType>) -> Self {
        Self { content_types }
    }

    /// Grants implied by one purchase.
    ///
    /// A bundle yields one grant per known content type. A single purchase
    /// yields exactly one grant for its content type.
    pub fn grants_for(&self, purchase: &Purchase) -> Vec<UserAccess> {
        match (purchase.is_bundle, purchase.content_type_id) {
            (false, Some(content_type_id)) => vec![UserAccess::new(
                purchase.user_id.clone(),
                purchase.subject_id,
                content_type_id,
            )],
            (false, None) => {
                tracing::warn!(
                    purchase_id = %purchase.id,
                    "Non-bundle purchase without content type; granting nothing"
                );
                Vec::new()
            }
            (true, _) => self
                .content_types
                .iter()
                .map(|ct| UserAccess::new(purchase.user_id.clone(), purchase.subject_id, ct.id))
                .collect(),
        }
    }

    /// Grants for several purchases, de-duplicated and minus rows that
    /// already exist.
    pub fn resolve<'a>(
        &self,
        purchases: impl IntoIterator<Item = &'a Purchase>,
        existing: &HashSet<AccessKey>,
    ) -> Vec<UserAccess> {
        let mut seen: HashSet<AccessKey> = existing.clone();
        let mut grants = Vec::new();

        for purchase in purchases {
            for grant in self.grants_for(purchase) {
                if seen.insert(grant.key()) {
                    grants.push(grant);
                }
            }
        }

        grants
    }
}
