use super::TransportError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::debug;

/// Response event pushed back to connected clients
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutboundEvent {
    pub event: String,
    pub payload: Value,
    pub timestamp: DateTime<Utc>,
}

/// Pushes named response events back through the transport
pub trait Publisher: Send + Sync {
    fn publish(&self, event: &str, payload: Value) -> Result<(), TransportError>;
}

/// Publisher fanning events out on a tokio broadcast channel
#[derive(Clone)]
pub struct BroadcastPublisher {
    tx: broadcast::Sender<OutboundEvent>,
}

impl BroadcastPublisher {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OutboundEvent> {
        self.tx.subscribe()
    }
}

impl Publisher for BroadcastPublisher {
    fn publish(&self, event: &str, payload: Value) -> Result<(), TransportError> {
        let outbound = OutboundEvent {
            event: event.to_string(),
            payload,
            timestamp: Utc::now(),
        };

        // No subscribers is fine
        if self.tx.send(outbound).is_err() {
            debug!(event = %event, "No subscribers for outbound event");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_publish_reaches_subscribers() {
        let publisher = BroadcastPublisher::new(8);
        let mut rx = publisher.subscribe();

        publisher
            .publish("entity_removed", json!({ "id": "A1", "existed": true }))
            .unwrap();

        let event = rx.try_recv().unwrap();
        assert_eq!(event.event, "entity_removed");
        assert_eq!(event.payload["existed"], json!(true));
    }

    #[test]
    fn test_publish_without_subscribers_is_ok() {
        let publisher = BroadcastPublisher::new(8);
        assert!(publisher.publish("entity_ids", json!({ "ids": [] })).is_ok());
    }
}
