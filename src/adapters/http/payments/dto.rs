//! HTTP DTOs for payment endpoints.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::payment::{Currency, Payment, PaymentStatus, PaymentType};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to create a payment.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentCreateRequest {
    /// Amount in major units, e.g. "25.00".
    pub amount: Decimal,

    #[serde(default = "default_currency")]
    pub currency: Currency,

    #[serde(default = "default_payment_type")]
    pub payment_type: PaymentType,

    #[serde(default)]
    pub reservation_id: Option<Uuid>,
    #[serde(default)]
    pub subscription_id: Option<Uuid>,
    #[serde(default)]
    pub user_id: Option<Uuid>,

    #[serde(default)]
    pub payer_email: Option<String>,
    #[serde(default)]
    pub payer_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,

    #[serde(default)]
    pub success_url: Option<String>,
    #[serde(default)]
    pub cancel_url: Option<String>,
}

fn default_currency() -> Currency {
    Currency::Usd
}

fn default_payment_type() -> PaymentType {
    PaymentType::Reservation
}

/// Request body for a refund; empty body means full refund.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentRefundRequest {
    #[serde(default)]
    pub amount: Option<Decimal>,
}

/// Query parameters for listing payments.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentListQuery {
    #[serde(default)]
    pub reservation_id: Option<Uuid>,
    #[serde(default)]
    pub subscription_id: Option<Uuid>,
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub status: Option<PaymentStatus>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    100
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Response after creating a payment.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentIntentResponse {
    pub payment_id: String,
    pub status: PaymentStatus,
    pub provider: String,
    pub checkout_url: Option<String>,
    pub client_secret: Option<String>,
    pub idempotent_replay: bool,
}

/// Full payment details.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentResponse {
    pub id: String,
    pub amount: String,
    pub currency: Currency,
    pub status: PaymentStatus,
    pub payment_type: PaymentType,
    pub reservation_id: Option<String>,
    pub subscription_id: Option<String>,
    pub user_id: Option<String>,
    pub provider: String,
    pub provider_payment_id: Option<String>,
    pub checkout_url: Option<String>,
    pub payer_email: Option<String>,
    pub payer_name: Option<String>,
    pub description: Option<String>,
    pub metadata: HashMap<String, serde_json::Value>,
    pub failure_reason: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Payment> for PaymentResponse {
    fn from(payment: Payment) -> Self {
        Self {
            id: payment.id.to_string(),
            amount: payment.amount_string(),
            currency: payment.currency,
            status: payment.status,
            payment_type: payment.payment_type,
            reservation_id: payment.reservation_id.map(|id| id.to_string()),
            subscription_id: payment.subscription_id.map(|id| id.to_string()),
            user_id: payment.user_id.map(|id| id.to_string()),
            provider: payment.provider,
            provider_payment_id: payment.provider_payment_id,
            checkout_url: payment.checkout_url,
            payer_email: payment.payer_email,
            payer_name: payment.payer_name,
            description: payment.description,
            metadata: payment.metadata,
            failure_reason: payment.failure_reason,
            created_at: payment.created_at.to_rfc3339(),
            updated_at: payment.updated_at.to_rfc3339(),
        }
    }
}

/// Response after verification against the provider.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentVerifyResponse {
    pub payment_id: String,
    pub previous_status: PaymentStatus,
    pub current_status: PaymentStatus,
    pub synchronized: bool,
}

/// Response after a cancellation attempt.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentCancelResponse {
    pub payment_id: String,
    pub status: PaymentStatus,
    pub canceled: bool,
}

/// Response after a refund attempt.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentRefundResponse {
    pub payment_id: String,
    pub status: PaymentStatus,
    pub refunded: bool,
    pub refund_id: Option<String>,
    pub error_message: Option<String>,
}
