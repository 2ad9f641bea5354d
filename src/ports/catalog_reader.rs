//! Catalog reader port.
//!
//! The catalog is owned by the content side of the platform; checkout only
//! reads names, the content type list and list prices.

use async_trait::async_trait;

use crate::domain::cart::CartLine;
use crate::domain::catalog::{ContentType, SessionType, Subject};
use crate::domain::foundation::{DomainError, Money, SessionTypeId, SubjectId};

#[async_trait]
pub trait CatalogReader: Send + Sync {
    /// Every content type; a bundle grants one access row per entry.
    async fn list_content_types(&self) -> Result<Vec<ContentType>, DomainError>;

    /// Subjects for the given ids. Unknown ids are skipped.
    async fn find_subjects(&self, ids: &[SubjectId]) -> Result<Vec<Subject>, DomainError>;

    /// List price of a subject bundle or of one content type within it.
    ///
    /// `None` when the subject or content type is unknown, or the line is
    /// not offered for sale.
    async fn find_course_price(
        &self,
        subject_id: &SubjectId,
        line: &CartLine,
    ) -> Result<Option<Money>, DomainError>;

    async fn find_session_type(
        &self,
        id: &SessionTypeId,
    ) -> Result<Option<SessionType>, DomainError>;
}
