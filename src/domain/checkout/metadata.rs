//! Typed checkout metadata envelope.
//!
//! Wire format (string-keyed, as the provider stores it):
//!
//! | key            | value                                   |
//! |----------------|-----------------------------------------|
//! | `v`            | envelope version, currently `"1"`       |
//! | `type`         | `"session_booking"` or absent           |
//! | `userId`       | purchasing user                         |
//! | `cartItemIds`  | JSON array of cart item ids, as string  |
//! | `lineAmounts`  | JSON array of charged cents, one per id |
//! | `offerId`      | applied offer, optional                 |
//! | `offerCode`    | normalized code, optional               |
//! | `discountAmount` | total discount as decimal string      |
//! | `bookingId`    | booking being paid for                  |
//!
//! A missing `type` (or any value other than `session_booking`) means a
//! cart checkout. Envelopes written before versioning carry no `v` key and
//! are read as version 1. Envelopes without `lineAmounts` predate frozen
//! line amounts and parse with an empty list.

use std::collections::HashMap;

use thiserror::Error;

use crate::domain::foundation::{BookingId, CartItemId, Money, OfferId, UserId};

/// Current envelope version.
pub const METADATA_VERSION: &str = "1";

/// Provider limit on a single metadata value.
pub const MAX_METADATA_VALUE_LEN: usize = 500;

/// Most cart lines one checkout can carry. Twelve quoted ids fit in
/// `cartItemIds`; a thirteenth would exceed [`MAX_METADATA_VALUE_LEN`].
pub const MAX_CHECKOUT_ITEMS: usize = 12;

const KEY_VERSION: &str = "v";
const KEY_TYPE: &str = "type";
const KEY_USER_ID: &str = "userId";
const KEY_CART_ITEM_IDS: &str = "cartItemIds";
const KEY_LINE_AMOUNTS: &str = "lineAmounts";
const KEY_OFFER_ID: &str = "offerId";
const KEY_OFFER_CODE: &str = "offerCode";
const KEY_DISCOUNT_AMOUNT: &str = "discountAmount";
const KEY_BOOKING_ID: &str = "bookingId";

const TYPE_SESSION_BOOKING: &str = "session_booking";

/// Errors reading or writing the envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetadataError {
    #[error("Missing metadata field: {0}")]
    MissingField(&'static str),

    #[error("Invalid metadata field '{field}': {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Unsupported metadata version: {0}")]
    UnsupportedVersion(String),

    #[error("Metadata field '{0}' exceeds provider size limit")]
    TooLarge(&'static str),
}

/// Offer tracking carried from checkout to reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedOffer {
    pub offer_id: OfferId,
    pub offer_code: Option<String>,
    pub discount_amount: Option<Money>,
}

/// A course/bundle checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartCheckout {
    pub user_id: UserId,
    pub cart_item_ids: Vec<CartItemId>,
    /// What each line was charged, index-aligned with `cart_item_ids`.
    /// Empty on envelopes written before amounts were frozen.
    pub line_amounts: Vec<Money>,
    pub offer: Option<AppliedOffer>,
}

impl CartCheckout {
    /// Charged amount for a line, when the envelope froze one.
    pub fn charged_for(&self, id: CartItemId) -> Option<Money> {
        if self.line_amounts.len() != self.cart_item_ids.len() {
            return None;
        }
        self.cart_item_ids
            .iter()
            .position(|candidate| *candidate == id)
            .map(|index| self.line_amounts[index])
    }
}

/// A 1:1 session booking checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingCheckout {
    pub booking_id: BookingId,
    pub user_id: Option<UserId>,
}

/// Checkout intent, tagged by the `type` key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutMetadata {
    Cart(CartCheckout),
    SessionBooking(BookingCheckout),
}

impl CheckoutMetadata {
    /// The purchasing user, when the envelope names one.
    pub fn user_id(&self) -> Option<&UserId> {
        match self {
            CheckoutMetadata::Cart(cart) => Some(&cart.user_id),
            CheckoutMetadata::SessionBooking(booking) => booking.user_id.as_ref(),
        }
    }

    /// Serializes the envelope to the provider's string map.
    ///
    /// # Errors
    ///
    /// `TooLarge` when a value (typically the cart id list) would exceed
    /// the provider's per-value limit.
    pub fn to_provider_metadata(&self) -> Result<HashMap<String, String>, MetadataError> {
        let mut map = HashMap::new();
        map.insert(KEY_VERSION.to_string(), METADATA_VERSION.to_string());

        match self {
            CheckoutMetadata::Cart(cart) => {
                map.insert(KEY_USER_ID.to_string(), cart.user_id.to_string());

                let ids: Vec<String> = cart.cart_item_ids.iter().map(|id| id.to_string()).collect();
                let encoded = serde_json::to_string(&ids).map_err(|e| MetadataError::InvalidField {
                    field: KEY_CART_ITEM_IDS,
                    reason: e.to_string(),
                })?;
                if encoded.len() > MAX_METADATA_VALUE_LEN {
                    return Err(MetadataError::TooLarge(KEY_CART_ITEM_IDS));
                }
                map.insert(KEY_CART_ITEM_IDS.to_string(), encoded);

                if !cart.line_amounts.is_empty() {
                    map.insert(KEY_LINE_AMOUNTS.to_string(), encode_line_amounts(cart)?);
                }

                if let Some(offer) = &cart.offer {
                    map.insert(KEY_OFFER_ID.to_string(), offer.offer_id.to_string());
                    if let Some(code) = &offer.offer_code {
                        map.insert(KEY_OFFER_CODE.to_string(), code.clone());
                    }
                    if let Some(amount) = offer.discount_amount {
                        map.insert(KEY_DISCOUNT_AMOUNT.to_string(), amount.to_string());
                    }
                }
            }
            CheckoutMetadata::SessionBooking(booking) => {
                map.insert(KEY_TYPE.to_string(), TYPE_SESSION_BOOKING.to_string());
                map.insert(KEY_BOOKING_ID.to_string(), booking.booking_id.to_string());
                if let Some(user_id) = &booking.user_id {
                    map.insert(KEY_USER_ID.to_string(), user_id.to_string());
                }
            }
        }

        Ok(map)
    }

    /// Parses the provider's string map.
    ///
    /// Offer fields are bookkeeping only: unparsable offer values drop the
    /// offer rather than failing the whole envelope.
    ///
    /// # Errors
    ///
    /// `MissingField`/`InvalidField` for absent or malformed required keys,
    /// `UnsupportedVersion` for an envelope newer than this build.
    pub fn from_provider_metadata(map: &HashMap<String, String>) -> Result<Self, MetadataError> {
        if let Some(version) = map.get(KEY_VERSION) {
            if version != METADATA_VERSION {
                return Err(MetadataError::UnsupportedVersion(version.clone()));
            }
        }

        if map.get(KEY_TYPE).map(String::as_str) == Some(TYPE_SESSION_BOOKING) {
            return Self::parse_booking(map);
        }
        Self::parse_cart(map)
    }

    fn parse_booking(map: &HashMap<String, String>) -> Result<Self, MetadataError> {
        let raw = non_empty(map, KEY_BOOKING_ID).ok_or(MetadataError::MissingField(KEY_BOOKING_ID))?;
        let booking_id = raw.parse::<BookingId>().map_err(|e| MetadataError::InvalidField {
            field: KEY_BOOKING_ID,
            reason: e.to_string(),
        })?;
        let user_id = non_empty(map, KEY_USER_ID).and_then(|u| UserId::new(u).ok());

        Ok(CheckoutMetadata::SessionBooking(BookingCheckout {
            booking_id,
            user_id,
        }))
    }

    fn parse_cart(map: &HashMap<String, String>) -> Result<Self, MetadataError> {
        let user_raw = non_empty(map, KEY_USER_ID).ok_or(MetadataError::MissingField(KEY_USER_ID))?;
        let user_id = UserId::new(user_raw).map_err(|e| MetadataError::InvalidField {
            field: KEY_USER_ID,
            reason: e.to_string(),
        })?;

        let ids_raw = non_empty(map, KEY_CART_ITEM_IDS)
            .ok_or(MetadataError::MissingField(KEY_CART_ITEM_IDS))?;
        let ids: Vec<String> =
            serde_json::from_str(ids_raw).map_err(|e| MetadataError::InvalidField {
                field: KEY_CART_ITEM_IDS,
                reason: e.to_string(),
            })?;
        let cart_item_ids = ids
            .iter()
            .map(|id| id.parse::<CartItemId>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| MetadataError::InvalidField {
                field: KEY_CART_ITEM_IDS,
                reason: e.to_string(),
            })?;
        if cart_item_ids.is_empty() {
            return Err(MetadataError::MissingField(KEY_CART_ITEM_IDS));
        }

        let line_amounts = match non_empty(map, KEY_LINE_AMOUNTS) {
            Some(raw) => decode_line_amounts(raw, cart_item_ids.len())?,
            None => Vec::new(),
        };

        let offer = non_empty(map, KEY_OFFER_ID)
            .and_then(|raw| raw.parse::<OfferId>().ok())
            .map(|offer_id| AppliedOffer {
                offer_id,
                offer_code: non_empty(map, KEY_OFFER_CODE).map(str::to_string),
                discount_amount: non_empty(map, KEY_DISCOUNT_AMOUNT)
                    .and_then(|raw| raw.parse().ok())
                    .and_then(|amount| Money::try_new(amount).ok()),
            });

        Ok(CheckoutMetadata::Cart(CartCheckout {
            user_id,
            cart_item_ids,
            line_amounts,
            offer,
        }))
    }
}

fn encode_line_amounts(cart: &CartCheckout) -> Result<String, MetadataError> {
    if cart.line_amounts.len() != cart.cart_item_ids.len() {
        return Err(MetadataError::InvalidField {
            field: KEY_LINE_AMOUNTS,
            reason: format!(
                "{} amounts for {} cart items",
                cart.line_amounts.len(),
                cart.cart_item_ids.len()
            ),
        });
    }
    let cents = cart
        .line_amounts
        .iter()
        .map(|amount| amount.to_minor_units())
        .collect::<Option<Vec<i64>>>()
        .ok_or_else(|| MetadataError::InvalidField {
            field: KEY_LINE_AMOUNTS,
            reason: "amount out of range".to_string(),
        })?;
    let encoded = serde_json::to_string(&cents).map_err(|e| MetadataError::InvalidField {
        field: KEY_LINE_AMOUNTS,
        reason: e.to_string(),
    })?;
    if encoded.len() > MAX_METADATA_VALUE_LEN {
        return Err(MetadataError::TooLarge(KEY_LINE_AMOUNTS));
    }
    Ok(encoded)
}

fn decode_line_amounts(raw: &str, expected: usize) -> Result<Vec<Money>, MetadataError> {
    let cents: Vec<i64> = serde_json::from_str(raw).map_err(|e| MetadataError::InvalidField {
        field: KEY_LINE_AMOUNTS,
        reason: e.to_string(),
    })?;
    if cents.len() != expected {
        return Err(MetadataError::InvalidField {
            field: KEY_LINE_AMOUNTS,
            reason: format!("{} amounts for {} cart items", cents.len(), expected),
        });
    }
    if cents.iter().any(|c| *c < 0) {
        return Err(MetadataError::InvalidField {
            field: KEY_LINE_AMOUNTS,
            reason: "negative amount".to_string(),
        });
    }
    Ok(cents.into_iter().map(Money::from_minor_units).collect())
}

fn non_empty<'a>(map: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    map.get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}
