//! Payment aggregate and its state machine.
//!
//! A payment starts PENDING, moves to PROCESSING once a provider intent
//! exists, and ends in SUCCEEDED, FAILED, or CANCELED. A succeeded payment
//! may later move to REFUNDED. Transition methods reject anything else with
//! [`PaymentError::StateConflict`] rather than silently coercing state.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    PaymentId, ReservationId, SubscriptionId, Timestamp, UserId,
};

use super::{Currency, PaymentError, PaymentStatus, PaymentType};

/// Payment aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    /// Internal identifier.
    pub id: PaymentId,

    /// Amount in major units (e.g. `25.00`), fixed-point.
    pub amount: Decimal,

    /// Settlement currency.
    pub currency: Currency,

    /// Lifecycle status.
    pub status: PaymentStatus,

    /// What the payment pays for.
    pub payment_type: PaymentType,

    /// Reservation being paid, if any.
    pub reservation_id: Option<ReservationId>,

    /// Subscription being paid, if any.
    pub subscription_id: Option<SubscriptionId>,

    /// Paying user, if known.
    pub user_id: Option<UserId>,

    /// Name of the provider that handles this payment.
    pub provider: String,

    /// Provider-assigned identifier. Set only by the PENDING -> PROCESSING
    /// transition.
    pub provider_payment_id: Option<String>,

    /// Hosted checkout URL for the payer, if the provider issued one.
    pub checkout_url: Option<String>,

    /// Payer contact fields.
    pub payer_email: Option<String>,
    pub payer_name: Option<String>,

    /// Free-form description shown on the checkout page.
    pub description: Option<String>,

    /// Caller-supplied metadata, echoed into outbound notifications.
    pub metadata: HashMap<String, serde_json::Value>,

    /// Unique key for create-once semantics, when the caller supplies one.
    pub idempotency_key: Option<String>,

    /// Why the payment failed, when it did.
    pub failure_reason: Option<String>,

    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Fields needed to create a new payment.
///
/// Everything not listed here starts at its initial value: status PENDING,
/// no provider data, timestamps at now.
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub amount: Decimal,
    pub currency: Currency,
    pub payment_type: PaymentType,
    pub provider: String,
    pub reservation_id: Option<ReservationId>,
    pub subscription_id: Option<SubscriptionId>,
    pub user_id: Option<UserId>,
    pub payer_email: Option<String>,
    pub payer_name: Option<String>,
    pub description: Option<String>,
    pub metadata: HashMap<String, serde_json::Value>,
    pub idempotency_key: Option<String>,
}

impl Payment {
    /// Creates a new payment in PENDING status.
    pub fn create(new: NewPayment) -> Self {
        let now = Timestamp::now();
        Self {
            id: PaymentId::new(),
            amount: new.amount,
            currency: new.currency,
            status: PaymentStatus::Pending,
            payment_type: new.payment_type,
            reservation_id: new.reservation_id,
            subscription_id: new.subscription_id,
            user_id: new.user_id,
            provider: new.provider,
            provider_payment_id: None,
            checkout_url: None,
            payer_email: new.payer_email,
            payer_name: new.payer_name,
            description: new.description,
            metadata: new.metadata,
            idempotency_key: new.idempotency_key,
            failure_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Marks the payment PROCESSING and records provider data.
    ///
    /// Legal only from PENDING; this is the only place
    /// `provider_payment_id` is ever set.
    pub fn mark_processing(
        &mut self,
        provider_payment_id: impl Into<String>,
        checkout_url: Option<String>,
    ) -> Result<(), PaymentError> {
        if self.status != PaymentStatus::Pending {
            return Err(PaymentError::state_conflict(self.status, "start processing"));
        }
        self.status = PaymentStatus::Processing;
        self.provider_payment_id = Some(provider_payment_id.into());
        self.checkout_url = checkout_url;
        self.touch();
        Ok(())
    }

    /// Marks the payment SUCCEEDED. Legal only from PROCESSING.
    pub fn mark_succeeded(&mut self) -> Result<(), PaymentError> {
        if self.status != PaymentStatus::Processing {
            return Err(PaymentError::state_conflict(self.status, "complete"));
        }
        self.status = PaymentStatus::Succeeded;
        self.touch();
        Ok(())
    }

    /// Marks the payment FAILED. Legal only from PROCESSING.
    pub fn mark_failed(&mut self, reason: Option<String>) -> Result<(), PaymentError> {
        if self.status != PaymentStatus::Processing {
            return Err(PaymentError::state_conflict(self.status, "fail"));
        }
        self.status = PaymentStatus::Failed;
        self.failure_reason = reason;
        self.touch();
        Ok(())
    }

    /// Marks the payment CANCELED. Legal from PENDING or PROCESSING.
    pub fn mark_canceled(&mut self) -> Result<(), PaymentError> {
        if !self.can_be_canceled() {
            return Err(PaymentError::state_conflict(self.status, "cancel"));
        }
        self.status = PaymentStatus::Canceled;
        self.touch();
        Ok(())
    }

    /// Marks the payment REFUNDED. Legal only from SUCCEEDED.
    pub fn mark_refunded(&mut self) -> Result<(), PaymentError> {
        if !self.can_be_refunded() {
            return Err(PaymentError::state_conflict(self.status, "refund"));
        }
        self.status = PaymentStatus::Refunded;
        self.touch();
        Ok(())
    }

    /// A payment can be canceled while not yet settled.
    pub fn can_be_canceled(&self) -> bool {
        matches!(
            self.status,
            PaymentStatus::Pending | PaymentStatus::Processing
        )
    }

    /// Only a succeeded payment can be refunded.
    pub fn can_be_refunded(&self) -> bool {
        self.status == PaymentStatus::Succeeded
    }

    /// Amount rendered as a decimal string with its stored scale, e.g. "25.00".
    pub fn amount_string(&self) -> String {
        self.amount.to_string()
    }

    /// Bumps `updated_at`, never letting it move backwards.
    fn touch(&mut self) {
        let now = Timestamp::now();
        if now.is_after(&self.updated_at) {
            self.updated_at = now;
        }
    }
}
