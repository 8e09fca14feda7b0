//! Payment provider port for external payment processing.
//!
//! Defines the contract for payment gateway integrations (Stripe and the
//! deterministic development provider). Implementations handle intent
//! creation, status verification, cancellation, refunds, and inbound
//! webhook signature verification.
//!
//! # Design
//!
//! - **Gateway agnostic**: the interface works with any provider
//! - **No panics on bad input**: signature verification returns a bool,
//!   business-rule refund refusals return `success = false`
//! - **Fixed status tables**: provider vocabulary maps onto
//!   [`PaymentStatus`] deterministically, never heuristically

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::payment::{Currency, PaymentError, PaymentStatus};

/// Request to create a payment intent with the provider.
#[derive(Debug, Clone)]
pub struct PaymentIntentRequest {
    /// Amount in major units.
    pub amount: Decimal,

    pub currency: Currency,

    /// Description shown on the hosted checkout page.
    pub description: Option<String>,

    /// Metadata echoed back in provider webhooks. Always contains the
    /// internal payment id under `payment_id`.
    pub metadata: HashMap<String, String>,

    /// Redirect targets after checkout.
    pub success_url: Option<String>,
    pub cancel_url: Option<String>,

    /// Pre-filled payer email.
    pub payer_email: Option<String>,
}

/// Result of creating a payment intent.
#[derive(Debug, Clone)]
pub struct PaymentIntent {
    /// Provider-assigned identifier.
    pub provider_payment_id: String,

    /// Client secret for embedded payment elements, when the provider
    /// issues one.
    pub client_secret: Option<String>,

    /// Hosted checkout URL for redirect flows.
    pub checkout_url: Option<String>,

    /// Status the payment starts in at the provider.
    pub status: PaymentStatus,
}

/// Result of a refund attempt.
///
/// Business-rule refusals (already refunded, charge missing) are reported
/// via `success = false`, never as an error.
#[derive(Debug, Clone)]
pub struct RefundOutcome {
    pub success: bool,
    pub refund_id: Option<String>,
    pub error_message: Option<String>,
}

impl RefundOutcome {
    /// A completed refund.
    pub fn succeeded(refund_id: impl Into<String>) -> Self {
        Self {
            success: true,
            refund_id: Some(refund_id.into()),
            error_message: None,
        }
    }

    /// A refused refund with a reason.
    pub fn refused(message: impl Into<String>) -> Self {
        Self {
            success: false,
            refund_id: None,
            error_message: Some(message.into()),
        }
    }
}

/// Errors from provider operations (gateway-class failures only).
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// Network failure reaching the provider.
    #[error("Network error: {0}")]
    Network(String),

    /// API key rejected.
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// The provider rejected the request.
    #[error("Provider API error: {message}")]
    Api {
        message: String,
        provider_code: Option<String>,
    },

    /// The provider returned something we could not interpret.
    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// Whether retrying the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProviderError::Network(_))
    }
}

impl From<ProviderError> for PaymentError {
    fn from(err: ProviderError) -> Self {
        PaymentError::Provider {
            retryable: err.is_retryable(),
            message: err.to_string(),
        }
    }
}

/// Port for payment provider integrations.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Name recorded on payments handled by this provider.
    fn name(&self) -> &'static str;

    /// Creates a payment intent and returns checkout data for the payer.
    async fn create_payment_intent(
        &self,
        request: PaymentIntentRequest,
    ) -> Result<PaymentIntent, ProviderError>;

    /// Fetches the current status of a payment from the provider.
    ///
    /// The provider's status vocabulary is mapped onto [`PaymentStatus`]
    /// through a fixed table.
    async fn verify_payment(&self, provider_payment_id: &str)
        -> Result<PaymentStatus, ProviderError>;

    /// Cancels a pending payment.
    ///
    /// Returns false when the payment is already terminal at the provider;
    /// errors are reserved for transport and auth failures.
    async fn cancel_payment(&self, provider_payment_id: &str) -> Result<bool, ProviderError>;

    /// Refunds a completed payment, partially when an amount is given.
    async fn refund_payment(
        &self,
        provider_payment_id: &str,
        amount: Option<Decimal>,
    ) -> Result<RefundOutcome, ProviderError>;

    /// Verifies the signature of an inbound provider webhook.
    ///
    /// Must not panic or error on malformed input; any problem yields false.
    fn verify_webhook_signature(&self, payload: &[u8], signature: &str) -> bool;
}
