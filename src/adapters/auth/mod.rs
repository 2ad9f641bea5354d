//! Authentication adapters.
//!
//! Implementations of the `SessionValidator` port:
//!
//! - `jwt` - HS256 tokens signed by the storefront's identity service
//! - `mock` - Test implementation that doesn't require signing keys

mod jwt;
mod mock;

pub use jwt::{JwtConfig, JwtSessionValidator, SessionClaims};
pub use mock::MockSessionValidator;
