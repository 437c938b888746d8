use super::InboundEvent;
use std::fmt;
use uuid::Uuid;

/// Validation errors for InboundEvent
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    MissingEvent,
    InvalidEventName(String),
    InvalidTimestamp(i64),
    PayloadNotObject,
    InvalidPayload(String, String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingEvent => write!(f, "event name is required"),
            ValidationError::InvalidEventName(name) => write!(
                f,
                "invalid event name '{}': must be lowercase with optional '_' or ':' separators",
                name
            ),
            ValidationError::InvalidTimestamp(ts) => {
                write!(f, "timestamp must be positive, got {}", ts)
            }
            ValidationError::PayloadNotObject => write!(f, "payload must be a JSON object"),
            ValidationError::InvalidPayload(event, reason) => {
                write!(f, "invalid payload for '{}': {}", event, reason)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validates and prepares an InboundEvent for dispatch.
///
/// Validation rules:
/// - Event name: lowercase letters, numbers, '_' and ':' (e.g., "upsert_entity")
/// - Payload: must be a JSON object
/// - Timestamp: must be positive when present (Unix epoch milliseconds)
/// - EventId: auto-generated UUIDv7 if missing or empty
pub fn validate_and_prepare(event: &mut InboundEvent) -> Result<(), ValidationError> {
    if event.event.is_empty() {
        return Err(ValidationError::MissingEvent);
    }

    if !is_valid_event_name(&event.event) {
        return Err(ValidationError::InvalidEventName(event.event.clone()));
    }

    if !event.payload.is_object() {
        return Err(ValidationError::PayloadNotObject);
    }

    if let Some(ts) = event.timestamp {
        if ts <= 0 {
            return Err(ValidationError::InvalidTimestamp(ts));
        }
    }

    if event.event_id.as_ref().map_or(true, |id| id.is_empty()) {
        event.event_id = Some(Uuid::now_v7().to_string());
    }

    Ok(())
}

/// Validates event name format.
///
/// Valid event names:
/// - Lowercase letters (a-z) and numbers (0-9)
/// - '_' and ':' as separators
/// - No leading/trailing separator
fn is_valid_event_name(name: &str) -> bool {
    let is_separator = |c: char| c == '_' || c == ':';

    if name.is_empty() || name.starts_with(is_separator) || name.ends_with(is_separator) {
        return false;
    }

    name.chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || is_separator(c))
}

#[cfg(test)]
mod validation_tests {
    use super::*;

    #[test]
    fn test_valid_event_names() {
        assert!(is_valid_event_name("upsert_entity"));
        assert!(is_valid_event_name("plane:update"));
        assert!(is_valid_event_name("add_point"));
        assert!(is_valid_event_name("v2"));
    }

    #[test]
    fn test_invalid_event_names() {
        assert!(!is_valid_event_name(""));
        assert!(!is_valid_event_name("_upsert"));
        assert!(!is_valid_event_name("upsert:"));
        assert!(!is_valid_event_name("Upsert"));
        assert!(!is_valid_event_name("upsert-entity"));
        assert!(!is_valid_event_name("upsert.entity"));
        assert!(!is_valid_event_name("upsert entity"));
    }
}
