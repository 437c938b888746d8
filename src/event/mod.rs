use serde::{Deserialize, Serialize};
use serde_json::Value;

mod payload;
mod validation;
#[cfg(test)]
mod tests;

pub use payload::{
    names, AnonymousPayload, GetPayload, RemovePayload, ScatterPayload, UpsertPayload,
};
pub use validation::{validate_and_prepare, ValidationError};

/// InboundEvent is a named, server-pushed event carrying a JSON payload.
///
/// The envelope is transport-agnostic: it arrives over the viewer
/// WebSocket or the HTTP ingestion endpoint and is routed by `event`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InboundEvent {
    /// UUIDv7 identifier, auto-generated if not provided
    #[serde(rename = "eventId", default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,

    /// Event name (e.g., "upsert_entity")
    pub event: String,

    /// Event data, must be a JSON object (defaults to `{}`)
    #[serde(default = "empty_payload")]
    pub payload: Value,

    /// Optional producer time, Unix epoch milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

fn empty_payload() -> Value {
    Value::Object(Default::default())
}

impl InboundEvent {
    /// Build an event with a given name and payload
    pub fn new(event: impl Into<String>, payload: Value) -> Self {
        Self {
            event_id: None,
            event: event.into(),
            payload,
            timestamp: None,
        }
    }

    /// Validates and prepares an event for dispatch.
    ///
    /// This method:
    /// - Validates the event name format
    /// - Validates the payload is a JSON object
    /// - Validates the timestamp is positive when present
    /// - Generates a UUIDv7 for event_id if missing
    pub fn validate_and_prepare(&mut self) -> Result<(), ValidationError> {
        validation::validate_and_prepare(self)
    }

    /// Deserialize the payload into a typed event body
    pub fn parse_payload<T: serde::de::DeserializeOwned>(&self) -> Result<T, ValidationError> {
        serde_json::from_value(self.payload.clone())
            .map_err(|e| ValidationError::InvalidPayload(self.event.clone(), e.to_string()))
    }
}
