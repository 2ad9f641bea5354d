//! Which storefront flow a checkout belongs to.

use serde::{Deserialize, Serialize};

/// Placeholder Stripe substitutes with the real session id on redirect.
pub const SESSION_ID_PLACEHOLDER: &str = "{CHECKOUT_SESSION_ID}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutKind {
    /// Cart of courses and bundles.
    Course,
    /// A paid 1:1 session booking.
    Session,
}

impl CheckoutKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutKind::Course => "course",
            CheckoutKind::Session => "session",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "course" => Some(CheckoutKind::Course),
            "session" => Some(CheckoutKind::Session),
            _ => None,
        }
    }

    /// Redirect target after payment; the success page runs the fallback.
    pub fn success_url(&self, base_url: &str) -> String {
        format!(
            "{}/checkout/success?session_id={}&type={}",
            base_url.trim_end_matches('/'),
            SESSION_ID_PLACEHOLDER,
            self.as_str()
        )
    }

    /// Where an abandoned checkout returns to.
    pub fn cancel_url(&self, base_url: &str) -> String {
        let base = base_url.trim_end_matches('/');
        match self {
            CheckoutKind::Course => format!("{}/cart", base),
            CheckoutKind::Session => format!("{}/sessions", base),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn course_urls() {
        let kind = CheckoutKind::Course;
        assert_eq!(
            kind.success_url("https://learn.example.com/"),
            "https://learn.example.com/checkout/success?session_id={CHECKOUT_SESSION_ID}&type=course"
        );
        assert_eq!(kind.cancel_url("https://learn.example.com"), "https://learn.example.com/cart");
    }

    #[test]
    fn session_success_url_carries_type() {
        assert!(CheckoutKind::Session
            .success_url("http://localhost:3000")
            .ends_with("&type=session"));
    }

    #[test]
    fn parse_rejects_unknown() {
        assert_eq!(CheckoutKind::parse("course"), Some(CheckoutKind::Course));
        assert_eq!(CheckoutKind::parse("membership"), None);
    }
}
