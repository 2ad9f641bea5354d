//! HTTP DTOs for the storefront endpoints.
//!
//! JSON bodies use camelCase to match the storefront frontend.

use serde::{Deserialize, Serialize};

use crate::application::{CreateBookingCheckoutResult, GetCartResult, VerifyCheckoutSessionResult};
use crate::domain::access::UserAccess;
use crate::domain::cart::CartItem;
use crate::domain::checkout::CheckoutKind;
use crate::domain::foundation::{
    ContentTypeId, Money, OfferId, SessionTypeId, SubjectId, Timestamp,
};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to open a checkout session for the cart.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutRequest {
    #[serde(default)]
    pub offer_code: Option<String>,
    #[serde(default)]
    pub offer_id: Option<OfferId>,
}

/// Request to book and pay for a 1:1 session.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingCheckoutRequest {
    pub session_type_id: SessionTypeId,
    pub contact_email: String,
    #[serde(default)]
    pub contact_name: Option<String>,
    /// ISO 8601.
    #[serde(default)]
    pub scheduled_at: Option<Timestamp>,
}

/// Success-page verification request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyCheckoutRequest {
    pub session_id: String,
    #[serde(rename = "type")]
    pub kind: CheckoutKind,
}

/// Request to add a line to the cart.
///
/// The price comes from the catalog; a `price` field sent by older
/// clients is ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub subject_id: SubjectId,
    #[serde(default)]
    pub content_type_id: Option<ContentTypeId>,
    #[serde(default)]
    pub is_bundle: bool,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub session_id: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingCheckoutResponse {
    pub session_id: String,
    pub url: String,
    pub booking_id: String,
}

impl From<CreateBookingCheckoutResult> for BookingCheckoutResponse {
    fn from(result: CreateBookingCheckoutResult) -> Self {
        Self {
            session_id: result.session_id,
            url: result.url,
            booking_id: result.booking_id.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyCheckoutResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub already_processed: Option<bool>,
}

impl From<VerifyCheckoutSessionResult> for VerifyCheckoutResponse {
    fn from(result: VerifyCheckoutSessionResult) -> Self {
        Self {
            success: result.success,
            message: result.message,
            already_processed: result.already_processed,
        }
    }
}

/// A cart line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemResponse {
    pub id: String,
    pub subject_id: String,
    pub content_type_id: Option<String>,
    pub is_bundle: bool,
    pub price: Money,
    /// ISO 8601.
    pub created_at: String,
}

impl From<CartItem> for CartItemResponse {
    fn from(item: CartItem) -> Self {
        Self {
            id: item.id.to_string(),
            subject_id: item.subject_id.to_string(),
            content_type_id: item.content_type_id.map(|id| id.to_string()),
            is_bundle: item.is_bundle,
            price: item.price,
            created_at: item.created_at.as_datetime().to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub items: Vec<CartItemResponse>,
    pub subtotal: Money,
}

impl From<GetCartResult> for CartResponse {
    fn from(result: GetCartResult) -> Self {
        Self {
            items: result.items.into_iter().map(CartItemResponse::from).collect(),
            subtotal: result.subtotal,
        }
    }
}

/// One unlocked (subject, content type) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessResponse {
    pub subject_id: String,
    pub content_type_id: String,
    pub granted_at: String,
}

impl From<UserAccess> for AccessResponse {
    fn from(access: UserAccess) -> Self {
        Self {
            subject_id: access.subject_id.to_string(),
            content_type_id: access.content_type_id.to_string(),
            granted_at: access.granted_at.as_datetime().to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookAck {
    pub received: bool,
}
