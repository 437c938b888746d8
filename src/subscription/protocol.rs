use crate::event::InboundEvent;
use crate::surface::MarkerCommand;
use crate::transport::OutboundEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Client → Server message types
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Push a named event to the tracker
    #[serde(rename = "push")]
    Push {
        event: String,
        #[serde(default = "empty_object")]
        payload: Value,
        #[serde(rename = "eventId", default)]
        event_id: Option<String>,
    },
    /// Ask for the full scene again
    #[serde(rename = "resync")]
    Resync,
}

fn empty_object() -> Value {
    Value::Object(Default::default())
}

impl ClientMessage {
    /// Turn a push frame into an inbound event (not yet validated)
    pub fn into_event(self) -> Option<InboundEvent> {
        match self {
            ClientMessage::Push {
                event,
                payload,
                event_id,
            } => Some(InboundEvent {
                event_id,
                event,
                payload,
                timestamp: Some(Utc::now().timestamp_millis()),
            }),
            ClientMessage::Resync => None,
        }
    }
}

/// Server → Client message types
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Draw command for the viewer's map
    Render { command: MarkerCommand },
    /// Response event from the tracker
    Event {
        event: String,
        payload: Value,
        timestamp: DateTime<Utc>,
    },
    /// Rejected client message
    Error { error: String },
}

impl From<MarkerCommand> for ServerMessage {
    fn from(command: MarkerCommand) -> Self {
        ServerMessage::Render { command }
    }
}

impl From<OutboundEvent> for ServerMessage {
    fn from(event: OutboundEvent) -> Self {
        ServerMessage::Event {
            event: event.event,
            payload: event.payload,
            timestamp: event.timestamp,
        }
    }
}

impl ServerMessage {
    pub fn error(error: impl Into<String>) -> Self {
        ServerMessage::Error {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::MarkerId;
    use serde_json::json;

    #[test]
    fn test_parse_push_message() {
        let msg: ClientMessage = serde_json::from_value(json!({
            "type": "push",
            "event": "remove_entity",
            "payload": { "id": "A1" }
        }))
        .unwrap();

        let event = msg.into_event().unwrap();
        assert_eq!(event.event, "remove_entity");
        assert_eq!(event.payload, json!({ "id": "A1" }));
        assert!(event.timestamp.unwrap() > 0);
    }

    #[test]
    fn test_push_without_payload() {
        let msg: ClientMessage =
            serde_json::from_value(json!({ "type": "push", "event": "clear_entities" })).unwrap();
        assert_eq!(msg.into_event().unwrap().payload, json!({}));
    }

    #[test]
    fn test_resync_has_no_event() {
        let msg: ClientMessage = serde_json::from_value(json!({ "type": "resync" })).unwrap();
        assert!(msg.into_event().is_none());
    }

    #[test]
    fn test_unknown_message_type_rejected() {
        let result = serde_json::from_value::<ClientMessage>(json!({ "type": "subscribe" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_render_message_format() {
        let msg = ServerMessage::from(MarkerCommand::DestroyMarker {
            marker_id: MarkerId(9),
        });
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({ "type": "render", "command": { "type": "destroy_marker", "marker_id": 9 } })
        );
    }

    #[test]
    fn test_event_message_format() {
        let msg = ServerMessage::from(OutboundEvent {
            event: "entities_cleared".to_string(),
            payload: json!({ "count": 3 }),
            timestamp: Utc::now(),
        });
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "event");
        assert_eq!(value["event"], "entities_cleared");
        assert_eq!(value["payload"]["count"], 3);
    }
}
