//! Offer code value object.
//!
//! Codes are compared case-insensitively, so they are normalized to
//! uppercase on construction. Surrounding whitespace is dropped.

use crate::domain::foundation::ValidationError;
use serde::{Deserialize, Serialize};

/// Longest code accepted from user input.
const MAX_CODE_LEN: usize = 64;

/// A normalized (trimmed, uppercased) promotional code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OfferCode(String);

impl OfferCode {
    /// Creates a new OfferCode.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the code is blank, too long, or
    /// contains characters other than ASCII letters, digits, `-` and `_`.
    pub fn try_new(code: &str) -> Result<Self, ValidationError> {
        let trimmed = code.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::empty_field("offer_code"));
        }
        if trimmed.len() > MAX_CODE_LEN {
            return Err(ValidationError::invalid_format(
                "offer_code",
                format!("at most {} characters", MAX_CODE_LEN),
            ));
        }
        if !trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ValidationError::invalid_format(
                "offer_code",
                "letters, digits, '-' and '_' only",
            ));
        }

        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison against raw user input.
    pub fn matches(&self, input: &str) -> bool {
        self.0.eq_ignore_ascii_case(input.trim())
    }
}

impl TryFrom<String> for OfferCode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        OfferCode::try_new(&value)
    }
}

impl From<OfferCode> for String {
    fn from(code: OfferCode) -> Self {
        code.0
    }
}

impl std::fmt::Display for OfferCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
