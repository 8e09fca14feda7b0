//! Deterministic payment provider for development and testing.
//!
//! Simulates the provider lifecycle without network access. Payment
//! transitions are injectable (`simulate_success` / `simulate_failure`) so
//! the inbound webhook handler and the verify flow can be exercised
//! end-to-end, and every call is recorded for assertions.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use rust_decimal::Decimal;
use secrecy::SecretString;
use uuid::Uuid;

use crate::domain::payment::PaymentStatus;
use crate::domain::webhook::SignatureCodec;
use crate::ports::{
    PaymentIntent, PaymentIntentRequest, PaymentProvider, ProviderError, RefundOutcome,
};

/// In-process payment provider with injectable behavior.
pub struct MockProvider {
    webhook_secret: SecretString,
    checkout_base_url: String,
    codec: SignatureCodec,
    inner: Mutex<MockState>,
}

#[derive(Default)]
struct MockState {
    /// Provider-side status per payment intent.
    payments: HashMap<String, PaymentStatus>,

    /// Method names, in call order, for test assertions.
    calls: Vec<&'static str>,
}

impl MockProvider {
    /// Creates a mock provider with the given webhook secret and codec.
    pub fn new(
        webhook_secret: SecretString,
        checkout_base_url: impl Into<String>,
        codec: SignatureCodec,
    ) -> Self {
        Self {
            webhook_secret,
            checkout_base_url: checkout_base_url.into(),
            codec,
            inner: Mutex::new(MockState::default()),
        }
    }

    /// Moves a payment to SUCCEEDED at the "provider".
    pub fn simulate_success(&self, provider_payment_id: &str) {
        self.inner
            .lock()
            .unwrap()
            .payments
            .insert(provider_payment_id.to_string(), PaymentStatus::Succeeded);
    }

    /// Moves a payment to FAILED at the "provider".
    pub fn simulate_failure(&self, provider_payment_id: &str) {
        self.inner
            .lock()
            .unwrap()
            .payments
            .insert(provider_payment_id.to_string(), PaymentStatus::Failed);
    }

    /// Signs a payload the way this provider signs its webhooks.
    ///
    /// Lets tests and the development signature endpoint fabricate valid
    /// inbound callbacks.
    pub fn sign_webhook(&self, payload: &str) -> String {
        self.codec.sign(&self.webhook_secret, payload)
    }

    /// Method names recorded so far, in call order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.inner.lock().unwrap().calls.clone()
    }

    fn record(&self, method: &'static str) {
        self.inner.lock().unwrap().calls.push(method);
    }
}

#[async_trait]
impl PaymentProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn create_payment_intent(
        &self,
        request: PaymentIntentRequest,
    ) -> Result<PaymentIntent, ProviderError> {
        self.record("create_payment_intent");

        let provider_payment_id = format!("mock_pi_{}", Uuid::new_v4().simple());
        let client_secret = format!("mock_secret_{}", Uuid::new_v4().simple());
        let checkout_url = format!(
            "{}/mock-checkout?payment_id={}&amount={}&currency={}",
            self.checkout_base_url,
            provider_payment_id,
            request.amount,
            request.currency.code(),
        );

        self.inner
            .lock()
            .unwrap()
            .payments
            .insert(provider_payment_id.clone(), PaymentStatus::Pending);

        Ok(PaymentIntent {
            provider_payment_id,
            client_secret: Some(client_secret),
            checkout_url: Some(checkout_url),
            status: PaymentStatus::Pending,
        })
    }

    async fn verify_payment(
        &self,
        provider_payment_id: &str,
    ) -> Result<PaymentStatus, ProviderError> {
        self.record("verify_payment");

        // Unknown payments report SUCCEEDED so the happy path needs no setup.
        Ok(self
            .inner
            .lock()
            .unwrap()
            .payments
            .get(provider_payment_id)
            .copied()
            .unwrap_or(PaymentStatus::Succeeded))
    }

    async fn cancel_payment(&self, provider_payment_id: &str) -> Result<bool, ProviderError> {
        self.record("cancel_payment");

        let mut state = self.inner.lock().unwrap();
        match state.payments.get(provider_payment_id).copied() {
            Some(status) if status.is_terminal() || status == PaymentStatus::Succeeded => {
                Ok(false)
            }
            _ => {
                state
                    .payments
                    .insert(provider_payment_id.to_string(), PaymentStatus::Canceled);
                Ok(true)
            }
        }
    }

    async fn refund_payment(
        &self,
        provider_payment_id: &str,
        _amount: Option<Decimal>,
    ) -> Result<RefundOutcome, ProviderError> {
        self.record("refund_payment");

        let mut state = self.inner.lock().unwrap();
        match state.payments.get(provider_payment_id).copied() {
            Some(PaymentStatus::Succeeded) | None => {
                state
                    .payments
                    .insert(provider_payment_id.to_string(), PaymentStatus::Refunded);
                Ok(RefundOutcome::succeeded(format!(
                    "mock_re_{}",
                    Uuid::new_v4().simple()
                )))
            }
            Some(status) => Ok(RefundOutcome::refused(format!(
                "payment in status '{status}' cannot be refunded"
            ))),
        }
    }

    fn verify_webhook_signature(&self, payload: &[u8], signature: &str) -> bool {
        self.codec.verify(&self.webhook_secret, payload, signature)
    }
}
