//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Storage Ports
//!
//! - `CartRepository`, `OfferRepository`, `PurchaseRepository`,
//!   `UserAccessRepository`, `BookingRepository`, `CatalogReader`
//! - `PurchaseLedger` - Atomic purchase/access/cart-cleanup commit
//! - `WebhookEventRepository` - Stripe event-id deduplication
//!
//! ## External Service Ports
//!
//! - `PaymentProvider` - Hosted checkout sessions
//! - `NotificationSender` - Transactional email
//! - `SessionValidator` - Bearer token validation
//! - `RateLimiter` - Request quotas

mod access_repository;
mod booking_repository;
mod cart_repository;
mod catalog_reader;
mod notification_sender;
mod offer_repository;
mod payment_provider;
mod purchase_ledger;
mod purchase_repository;
mod rate_limiter;
mod session_validator;
mod webhook_event_repository;

pub use access_repository::UserAccessRepository;
pub use booking_repository::BookingRepository;
pub use cart_repository::CartRepository;
pub use catalog_reader::CatalogReader;
pub use notification_sender::{BookingConfirmation, NotificationSender};
pub use offer_repository::OfferRepository;
pub use payment_provider::{
    CheckoutSession, CreateCheckoutRequest, PaymentError, PaymentErrorCode, PaymentProvider,
};
pub use purchase_ledger::{LedgerOutcome, PurchaseLedger, PurchasePlan};
pub use purchase_repository::PurchaseRepository;
pub use rate_limiter::{
    RateLimitDenied, RateLimitError, RateLimitKey, RateLimitResult, RateLimitScope,
    RateLimitStatus, RateLimiter,
};
pub use session_validator::SessionValidator;
pub use webhook_event_repository::{
    SaveResult, WebhookDisposition, WebhookEventRecord, WebhookEventRepository, WebhookResult,
};
