// Event transport: named event routing, response publishing, and the
// single-writer loop that owns the tracker

mod hook;
mod publisher;
mod router;

pub use hook::{run_event_loop, tracker_router, TrackerCommand, TrackerHandle};
pub use publisher::{BroadcastPublisher, OutboundEvent, Publisher};
pub use router::{EventRouter, Handler};

use std::fmt;

/// Transport-level failures
#[derive(Debug, Clone, PartialEq)]
pub enum TransportError {
    /// Payload could not be encoded
    Serialization(String),
    /// Event loop queue is full
    QueueFull,
    /// Event loop has shut down
    Closed,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Serialization(msg) => write!(f, "failed to encode event: {}", msg),
            TransportError::QueueFull => write!(f, "event queue is full"),
            TransportError::Closed => write!(f, "event loop is not running"),
        }
    }
}

impl std::error::Error for TransportError {}
