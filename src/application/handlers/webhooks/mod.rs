//! Webhook handlers - outbound fan-out and inbound provider callbacks.

mod dispatch;
mod inbound;

pub use dispatch::{
    DeliveryOutcome, DispatchReport, PartnerDeliveryResult, WebhookDispatcher,
};
pub use inbound::{InboundOutcome, InboundWebhookHandler};

use serde_json::{Map, Value};

use crate::domain::payment::Payment;

/// Normalized payload fields for payment events.
///
/// Every payment notification carries the same shape: payment id, amount as
/// a decimal string, currency, status, provider, and the correlation ids
/// that are present.
pub(crate) fn payment_event_fields(payment: &Payment) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert(
        "payment_id".to_string(),
        Value::String(payment.id.to_string()),
    );
    fields.insert(
        "amount".to_string(),
        Value::String(payment.amount_string()),
    );
    fields.insert(
        "currency".to_string(),
        Value::String(payment.currency.code().to_string()),
    );
    fields.insert(
        "status".to_string(),
        Value::String(payment.status.as_str().to_string()),
    );
    fields.insert(
        "provider".to_string(),
        Value::String(payment.provider.clone()),
    );
    if let Some(reservation_id) = &payment.reservation_id {
        fields.insert(
            "reservation_id".to_string(),
            Value::String(reservation_id.to_string()),
        );
    }
    if let Some(subscription_id) = &payment.subscription_id {
        fields.insert(
            "subscription_id".to_string(),
            Value::String(subscription_id.to_string()),
        );
    }
    if let Some(user_id) = &payment.user_id {
        fields.insert("user_id".to_string(), Value::String(user_id.to_string()));
    }
    fields
}
