//! Inbound provider webhook handler.
//!
//! One provider callback flows through a fixed pipeline: verify the
//! signature, parse the event envelope, map the provider's event name onto a
//! canonical action, load the referenced payment, drive its state machine,
//! and fan the resulting domain event out to partners.
//!
//! Unknown event types are acknowledged without any state change so the
//! provider does not retry them.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::domain::foundation::PaymentId;
use crate::domain::partner::EventType;
use crate::domain::payment::{Payment, PaymentStatus};
use crate::domain::webhook::WebhookError;
use crate::ports::{PaymentProvider, PaymentRepository};

use super::dispatch::WebhookDispatcher;
use super::payment_event_fields;

/// Canonical actions a provider callback can trigger.
///
/// The mapping from provider event names is a fixed lookup; anything not in
/// the table is acknowledged and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProviderAction {
    PaymentCompleted,
    PaymentFailed,
    PaymentExpired,
    ChargeRefunded,
}

fn map_provider_event(event_type: &str) -> Option<ProviderAction> {
    match event_type {
        // Hosted-checkout vocabulary.
        "checkout.session.completed" => Some(ProviderAction::PaymentCompleted),
        "checkout.session.expired" => Some(ProviderAction::PaymentExpired),
        "charge.refunded" => Some(ProviderAction::ChargeRefunded),
        // Development provider vocabulary.
        "payment.succeeded" => Some(ProviderAction::PaymentCompleted),
        "payment.failed" => Some(ProviderAction::PaymentFailed),
        _ => None,
    }
}

/// Provider event envelope (fields we read from either vocabulary).
#[derive(Debug, Deserialize)]
struct ProviderEvent {
    #[serde(rename = "type")]
    event_type: String,

    /// Hosted-checkout events nest the object under `data`.
    #[serde(default)]
    data: Option<ProviderEventData>,

    /// Development provider events carry the payment id at the top level.
    #[serde(default)]
    payment_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProviderEventData {
    #[serde(default)]
    object: Value,
}

impl ProviderEvent {
    /// The internal payment id embedded in provider metadata.
    fn payment_id(&self) -> Option<&str> {
        if let Some(id) = &self.payment_id {
            return Some(id);
        }
        self.data
            .as_ref()
            .and_then(|data| data.object.get("metadata"))
            .and_then(|metadata| metadata.get("payment_id"))
            .and_then(Value::as_str)
    }
}

/// Result of handling one provider callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundOutcome {
    /// A transition was applied and partners were notified.
    Processed {
        payment_id: PaymentId,
        event: EventType,
    },

    /// The payment already observed this status; nothing changed.
    AlreadyCurrent { payment_id: PaymentId },

    /// Unknown event type; acknowledged without state change.
    Acknowledged,
}

/// Handles inbound provider webhooks.
pub struct InboundWebhookHandler {
    provider: Arc<dyn PaymentProvider>,
    repository: Arc<dyn PaymentRepository>,
    dispatcher: Arc<WebhookDispatcher>,
}

impl InboundWebhookHandler {
    pub fn new(
        provider: Arc<dyn PaymentProvider>,
        repository: Arc<dyn PaymentRepository>,
        dispatcher: Arc<WebhookDispatcher>,
    ) -> Self {
        Self {
            provider,
            repository,
            dispatcher,
        }
    }

    /// Verifies and processes one provider callback.
    pub async fn handle(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<InboundOutcome, WebhookError> {
        if !self.provider.verify_webhook_signature(payload, signature) {
            tracing::warn!(provider = self.provider.name(), "Rejected inbound webhook");
            return Err(WebhookError::InvalidSignature);
        }

        let event: ProviderEvent = serde_json::from_slice(payload)
            .map_err(|e| WebhookError::ParseError(e.to_string()))?;

        let action = match map_provider_event(&event.event_type) {
            Some(action) => action,
            None => {
                tracing::debug!(
                    event_type = %event.event_type,
                    "Acknowledged unhandled provider event"
                );
                return Ok(InboundOutcome::Acknowledged);
            }
        };

        let payment_id: PaymentId = event
            .payment_id()
            .ok_or(WebhookError::MissingMetadata("payment_id"))?
            .parse()
            .map_err(|_| WebhookError::ParseError("invalid payment_id".to_string()))?;

        let mut payment = self
            .repository
            .get_by_id(&payment_id)
            .await
            .map_err(|e| WebhookError::Repository(e.to_string()))?
            .ok_or_else(|| WebhookError::PaymentNotFound(payment_id.to_string()))?;

        let (already_current, outbound) = match action {
            ProviderAction::PaymentCompleted => (
                payment.status == PaymentStatus::Succeeded,
                Some(EventType::PaymentSucceeded),
            ),
            ProviderAction::PaymentFailed => (
                payment.status == PaymentStatus::Failed,
                Some(EventType::PaymentFailed),
            ),
            ProviderAction::PaymentExpired => (payment.status == PaymentStatus::Canceled, None),
            ProviderAction::ChargeRefunded => (
                payment.status == PaymentStatus::Refunded,
                Some(EventType::PaymentRefunded),
            ),
        };

        // Redelivered callbacks observing the applied status are no-ops:
        // no transition, no timestamp bump, no second fan-out.
        if already_current {
            return Ok(InboundOutcome::AlreadyCurrent { payment_id });
        }

        self.apply(&mut payment, action)?;
        self.repository
            .update(&payment)
            .await
            .map_err(|e| WebhookError::Repository(e.to_string()))?;

        tracing::info!(
            payment_id = %payment.id,
            status = %payment.status,
            "Applied provider webhook"
        );

        match outbound {
            Some(event) => {
                self.dispatcher
                    .dispatch(event, payment_event_fields(&payment))
                    .await;
                Ok(InboundOutcome::Processed { payment_id, event })
            }
            None => Ok(InboundOutcome::AlreadyCurrent { payment_id }),
        }
    }

    fn apply(&self, payment: &mut Payment, action: ProviderAction) -> Result<(), WebhookError> {
        let result = match action {
            ProviderAction::PaymentCompleted => payment.mark_succeeded(),
            ProviderAction::PaymentFailed => {
                payment.mark_failed(Some("reported by provider".to_string()))
            }
            ProviderAction::PaymentExpired => payment.mark_canceled(),
            ProviderAction::ChargeRefunded => payment.mark_refunded(),
        };
        result.map_err(|e| WebhookError::InvalidTransition(e.to_string()))
    }
}
