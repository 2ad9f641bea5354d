//! Catalog module - Read-only reference data the checkout flow consults.
//!
//! Subjects and content types are managed elsewhere; checkout only needs
//! their titles for line-item names and the full content type list to
//! expand bundle purchases.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ContentTypeId, Money, SessionTypeId, SubjectId};

/// A course subject (e.g. "Organic Chemistry").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    pub title: String,
}

/// A kind of content sold per subject (e.g. "Video Lectures").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentType {
    pub id: ContentTypeId,
    pub name: String,
}

/// A bookable 1:1 session offering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionType {
    pub id: SessionTypeId,
    pub name: String,
    pub price: Money,
    pub duration_minutes: u32,
}

impl Subject {
    pub fn new(id: SubjectId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
        }
    }
}

impl ContentType {
    pub fn new(id: ContentTypeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}
