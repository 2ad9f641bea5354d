//! Adapters - Implementations of port interfaces.
//!
//! - `postgres` - sqlx repositories and the transactional purchase ledger
//! - `memory` - In-memory storage for tests and local runs
//! - `stripe` - Hosted checkout sessions
//! - `email` - Booking confirmations via Resend
//! - `auth` - Session token validation
//! - `rate_limiter` - In-memory and Redis request quotas
//! - `http` - axum routes and middleware
//! - `webhook_retention` - Periodic cleanup of handled webhook events

pub mod auth;
pub mod email;
pub mod http;
pub mod memory;
pub mod postgres;
pub mod rate_limiter;
pub mod stripe;
pub mod webhook_retention;
