//! Mock payment provider for testing.
//!
//! Supports:
//! - Recording created checkout requests
//! - Pre-configured sessions for retrieval
//! - Error injection

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::domain::checkout::CompletedCheckout;
use crate::ports::{CheckoutSession, CreateCheckoutRequest, PaymentError, PaymentProvider};

/// Mock payment provider for testing.
///
/// # Example
///
/// ```ignore
/// let mock = MockPaymentProvider::new();
/// mock.set_session(completed_checkout);
/// mock.fail_create(PaymentError::network("timeout"));
/// ```
#[derive(Default)]
pub struct MockPaymentProvider {
    inner: Mutex<MockState>,
}

#[derive(Default)]
struct MockState {
    /// Sessions returned by `retrieve_checkout_session`, keyed by id.
    sessions: HashMap<String, CompletedCheckout>,

    /// Every request passed to `create_checkout_session`.
    created: Vec<CreateCheckoutRequest>,

    create_error: Option<PaymentError>,
    retrieve_error: Option<PaymentError>,
}

impl MockPaymentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration Methods
    // ════════════════════════════════════════════════════════════════════════════

    /// Makes a session available to `retrieve_checkout_session`.
    pub fn set_session(&self, session: CompletedCheckout) {
        self.state().sessions.insert(session.session_id.clone(), session);
    }

    /// Every subsequent `create_checkout_session` returns this error.
    pub fn fail_create(&self, error: PaymentError) {
        self.state().create_error = Some(error);
    }

    /// Every subsequent `retrieve_checkout_session` returns this error.
    pub fn fail_retrieve(&self, error: PaymentError) {
        self.state().retrieve_error = Some(error);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Assertions
    // ════════════════════════════════════════════════════════════════════════════

    pub fn created_requests(&self) -> Vec<CreateCheckoutRequest> {
        self.state().created.clone()
    }

    pub fn last_request(&self) -> Option<CreateCheckoutRequest> {
        self.state().created.last().cloned()
    }
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    async fn create_checkout_session(
        &self,
        request: CreateCheckoutRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        let mut state = self.state();
        if let Some(err) = state.create_error.clone() {
            return Err(err);
        }
        state.created.push(request);
        let id = format!("cs_test_{}", state.created.len());
        Ok(CheckoutSession {
            url: format!("https://checkout.stripe.test/pay/{}", id),
            id,
        })
    }

    async fn retrieve_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<CompletedCheckout, PaymentError> {
        let state = self.state();
        if let Some(err) = state.retrieve_error.clone() {
            return Err(err);
        }
        state
            .sessions
            .get(session_id)
            .cloned()
            .ok_or_else(|| PaymentError::not_found("Checkout session"))
    }
}
