// Rendering surface abstraction and implementations

mod command;
mod ready;
mod recording;

pub use command::{CommandSurface, MapView, MarkerCommand};
pub use ready::{readiness, ReadyGate, ReadySignal};
pub use recording::{RecordedMarker, RecordingSurface, SurfaceCall};

use crate::render::Icon;
use crate::tracker::Position;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::sync::broadcast;

/// Drawing backend the tracker renders entities onto.
///
/// Handles are opaque to the tracker; it stores them and hands them back,
/// never inspects them. `destroy` consumes the handle.
pub trait RenderingSurface {
    type Handle: Clone + fmt::Debug + PartialEq;

    fn create_marker(&mut self, position: Position, icon: &Icon) -> Result<Self::Handle, SurfaceError>;

    fn update_position(&mut self, handle: &Self::Handle, position: Position) -> Result<(), SurfaceError>;

    fn set_icon(&mut self, handle: &Self::Handle, icon: &Icon) -> Result<(), SurfaceError>;

    /// Bind the tooltip on first call, replace its content afterwards.
    fn set_tooltip(&mut self, handle: &Self::Handle, text: &str) -> Result<(), SurfaceError>;

    fn destroy(&mut self, handle: Self::Handle) -> Result<(), SurfaceError>;
}

/// Surfaces that can describe their current scene as draw commands,
/// so a viewer connecting late can rebuild it.
pub trait SceneReplay {
    fn replay(&self) -> Vec<MarkerCommand>;

    /// Receiver for draw commands emitted after this call
    fn subscribe(&self) -> broadcast::Receiver<MarkerCommand>;

    /// Current scene plus a receiver for everything drawn after it.
    ///
    /// Both are taken under the same borrow, so no command is missing
    /// from the pair or present in both.
    fn snapshot(&self) -> SceneSnapshot {
        SceneSnapshot {
            commands: self.replay(),
            updates: self.subscribe(),
        }
    }
}

/// Scene replay and the live command stream that continues it
#[derive(Debug)]
pub struct SceneSnapshot {
    pub commands: Vec<MarkerCommand>,
    pub updates: broadcast::Receiver<MarkerCommand>,
}

/// Marker handle used by the bundled surfaces
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkerId(pub u64);

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "marker-{}", self.0)
    }
}

/// Failures raised by a rendering surface
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceError {
    /// Surface did not signal readiness within the allowed wait
    NotReady(Duration),
    /// Handle does not refer to a live marker
    UnknownHandle(String),
    /// Backend-specific failure
    Backend(String),
}

impl fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurfaceError::NotReady(waited) => {
                write!(f, "rendering surface not ready after {}ms", waited.as_millis())
            }
            SurfaceError::UnknownHandle(handle) => write!(f, "unknown marker handle '{}'", handle),
            SurfaceError::Backend(msg) => write!(f, "rendering surface error: {}", msg),
        }
    }
}

impl std::error::Error for SurfaceError {}
