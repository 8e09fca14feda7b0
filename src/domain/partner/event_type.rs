//! Outbound webhook event vocabulary.

use serde::{Deserialize, Serialize};

/// Events partners can subscribe to.
///
/// `All` is the wildcard subscription: it matches every concrete event but is
/// never dispatched itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "payment.created")]
    PaymentCreated,

    #[serde(rename = "payment.succeeded")]
    PaymentSucceeded,

    #[serde(rename = "payment.failed")]
    PaymentFailed,

    #[serde(rename = "payment.refunded")]
    PaymentRefunded,

    #[serde(rename = "reservation.created")]
    ReservationCreated,

    #[serde(rename = "reservation.confirmed")]
    ReservationConfirmed,

    #[serde(rename = "reservation.cancelled")]
    ReservationCancelled,

    #[serde(rename = "reservation.completed")]
    ReservationCompleted,

    #[serde(rename = "reservation.paid")]
    ReservationPaid,

    /// Wildcard subscription matching all events.
    #[serde(rename = "*")]
    All,
}

impl EventType {
    /// Wire name of the event.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::PaymentCreated => "payment.created",
            EventType::PaymentSucceeded => "payment.succeeded",
            EventType::PaymentFailed => "payment.failed",
            EventType::PaymentRefunded => "payment.refunded",
            EventType::ReservationCreated => "reservation.created",
            EventType::ReservationConfirmed => "reservation.confirmed",
            EventType::ReservationCancelled => "reservation.cancelled",
            EventType::ReservationCompleted => "reservation.completed",
            EventType::ReservationPaid => "reservation.paid",
            EventType::All => "*",
        }
    }

    /// Parses a wire name back into an event type.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "payment.created" => Some(EventType::PaymentCreated),
            "payment.succeeded" => Some(EventType::PaymentSucceeded),
            "payment.failed" => Some(EventType::PaymentFailed),
            "payment.refunded" => Some(EventType::PaymentRefunded),
            "reservation.created" => Some(EventType::ReservationCreated),
            "reservation.confirmed" => Some(EventType::ReservationConfirmed),
            "reservation.cancelled" => Some(EventType::ReservationCancelled),
            "reservation.completed" => Some(EventType::ReservationCompleted),
            "reservation.paid" => Some(EventType::ReservationPaid),
            "*" => Some(EventType::All),
            _ => None,
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_roundtrip() {
        for event in [
            EventType::PaymentCreated,
            EventType::PaymentSucceeded,
            EventType::PaymentFailed,
            EventType::PaymentRefunded,
            EventType::ReservationPaid,
            EventType::All,
        ] {
            assert_eq!(EventType::parse(event.as_str()), Some(event));
        }
    }

    #[test]
    fn unknown_names_do_not_parse() {
        assert_eq!(EventType::parse("payment.unknown"), None);
        assert_eq!(EventType::parse(""), None);
    }

    #[test]
    fn serde_uses_wire_names() {
        assert_eq!(
            serde_json::to_string(&EventType::PaymentSucceeded).unwrap(),
            "\"payment.succeeded\""
        );
        assert_eq!(serde_json::to_string(&EventType::All).unwrap(), "\"*\"");
    }
}
