//! Outbound event envelope.
//!
//! Every partner notification carries the same envelope: the event name, an
//! ISO-8601 UTC timestamp, and the caller-supplied event fields. The envelope
//! serializes deterministically (keys sorted) so the signed bytes and the
//! delivered body are always identical.

use serde_json::{Map, Value};

use crate::domain::foundation::Timestamp;
use crate::domain::partner::EventType;

/// Envelope for one outbound event.
#[derive(Debug, Clone)]
pub struct EventEnvelope {
    event: EventType,
    timestamp: Timestamp,
    fields: Map<String, Value>,
}

impl EventEnvelope {
    /// Builds an envelope stamped with the current time.
    pub fn new(event: EventType, fields: Map<String, Value>) -> Self {
        Self::at(event, Timestamp::now(), fields)
    }

    /// Builds an envelope with an explicit timestamp (tests).
    pub fn at(event: EventType, timestamp: Timestamp, fields: Map<String, Value>) -> Self {
        Self {
            event,
            timestamp,
            fields,
        }
    }

    pub fn event(&self) -> EventType {
        self.event
    }

    /// Serializes the envelope to the exact JSON body that gets signed and
    /// delivered. Caller fields never shadow the `event` and `timestamp`
    /// envelope keys.
    pub fn to_json(&self) -> String {
        let mut body = Map::new();
        body.insert("event".to_string(), Value::String(self.event.as_str().to_string()));
        body.insert(
            "timestamp".to_string(),
            Value::String(self.timestamp.to_rfc3339()),
        );
        for (key, value) in &self.fields {
            if key != "event" && key != "timestamp" {
                body.insert(key.clone(), value.clone());
            }
        }
        Value::Object(body).to_string()
    }
}
