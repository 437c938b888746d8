use super::{MarkerCommand, MarkerId, RenderingSurface, SceneReplay, SurfaceError};
use crate::render::Icon;
use crate::tracker::Position;
use std::collections::HashMap;
use tokio::sync::broadcast;

/// One call made against a [`RecordingSurface`]
#[derive(Clone, Debug, PartialEq)]
pub enum SurfaceCall {
    Create(MarkerId),
    UpdatePosition(MarkerId),
    SetIcon(MarkerId),
    SetTooltip(MarkerId),
    Destroy(MarkerId),
}

/// Current state of a live marker on a [`RecordingSurface`]
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedMarker {
    pub position: Position,
    pub icon: Icon,
    pub tooltip: Option<String>,
}

/// In-memory surface that keeps every marker and logs every call.
///
/// Used for headless runs and tests. `fail_next` makes the next call
/// return the given error without touching state. Nothing is broadcast:
/// subscribers only see the channel close when the surface drops.
#[derive(Debug)]
pub struct RecordingSurface {
    next_id: u64,
    markers: HashMap<MarkerId, RecordedMarker>,
    calls: Vec<SurfaceCall>,
    pending_failure: Option<SurfaceError>,
    pending_tooltip_failure: Option<SurfaceError>,
    tx: broadcast::Sender<MarkerCommand>,
}

impl Default for RecordingSurface {
    fn default() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            next_id: 0,
            markers: HashMap::new(),
            calls: Vec::new(),
            pending_failure: None,
            pending_tooltip_failure: None,
            tx,
        }
    }
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next surface call fail with `error`
    pub fn fail_next(&mut self, error: SurfaceError) {
        self.pending_failure = Some(error);
    }

    /// Make the next `set_tooltip` call fail with `error`, leaving other
    /// calls alone
    pub fn fail_next_tooltip(&mut self, error: SurfaceError) {
        self.pending_tooltip_failure = Some(error);
    }

    pub fn calls(&self) -> &[SurfaceCall] {
        &self.calls
    }

    pub fn marker(&self, id: MarkerId) -> Option<&RecordedMarker> {
        self.markers.get(&id)
    }

    pub fn live_markers(&self) -> usize {
        self.markers.len()
    }

    pub fn created(&self) -> usize {
        self.count(|c| matches!(c, SurfaceCall::Create(_)))
    }

    pub fn destroyed(&self) -> usize {
        self.count(|c| matches!(c, SurfaceCall::Destroy(_)))
    }

    /// Icon regenerations after creation
    pub fn icon_updates(&self) -> usize {
        self.count(|c| matches!(c, SurfaceCall::SetIcon(_)))
    }

    fn count(&self, pred: impl Fn(&SurfaceCall) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    fn check_failure(&mut self) -> Result<(), SurfaceError> {
        match self.pending_failure.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn live_mut(&mut self, id: &MarkerId) -> Result<&mut RecordedMarker, SurfaceError> {
        self.markers
            .get_mut(id)
            .ok_or_else(|| SurfaceError::UnknownHandle(id.to_string()))
    }
}

impl RenderingSurface for RecordingSurface {
    type Handle = MarkerId;

    fn create_marker(&mut self, position: Position, icon: &Icon) -> Result<MarkerId, SurfaceError> {
        self.check_failure()?;
        self.next_id += 1;
        let id = MarkerId(self.next_id);
        self.markers.insert(
            id,
            RecordedMarker {
                position,
                icon: icon.clone(),
                tooltip: None,
            },
        );
        self.calls.push(SurfaceCall::Create(id));
        Ok(id)
    }

    fn update_position(&mut self, handle: &MarkerId, position: Position) -> Result<(), SurfaceError> {
        self.check_failure()?;
        self.live_mut(handle)?.position = position;
        self.calls.push(SurfaceCall::UpdatePosition(*handle));
        Ok(())
    }

    fn set_icon(&mut self, handle: &MarkerId, icon: &Icon) -> Result<(), SurfaceError> {
        self.check_failure()?;
        self.live_mut(handle)?.icon = icon.clone();
        self.calls.push(SurfaceCall::SetIcon(*handle));
        Ok(())
    }

    fn set_tooltip(&mut self, handle: &MarkerId, text: &str) -> Result<(), SurfaceError> {
        self.check_failure()?;
        if let Some(err) = self.pending_tooltip_failure.take() {
            return Err(err);
        }
        self.live_mut(handle)?.tooltip = Some(text.to_string());
        self.calls.push(SurfaceCall::SetTooltip(*handle));
        Ok(())
    }

    fn destroy(&mut self, handle: MarkerId) -> Result<(), SurfaceError> {
        self.check_failure()?;
        self.markers
            .remove(&handle)
            .ok_or_else(|| SurfaceError::UnknownHandle(handle.to_string()))?;
        self.calls.push(SurfaceCall::Destroy(handle));
        Ok(())
    }
}

impl SceneReplay for RecordingSurface {
    fn replay(&self) -> Vec<MarkerCommand> {
        let mut ids: Vec<&MarkerId> = self.markers.keys().collect();
        ids.sort();

        let mut commands = Vec::with_capacity(ids.len() * 2);
        for id in ids {
            let marker = &self.markers[id];
            commands.push(MarkerCommand::CreateMarker {
                marker_id: *id,
                position: marker.position,
                icon: marker.icon.clone(),
            });
            if let Some(text) = &marker.tooltip {
                commands.push(MarkerCommand::SetTooltip {
                    marker_id: *id,
                    text: text.clone(),
                });
            }
        }
        commands
    }

    fn subscribe(&self) -> broadcast::Receiver<MarkerCommand> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::plane_icon;

    #[test]
    fn test_records_marker_lifecycle() {
        let mut surface = RecordingSurface::new();
        let id = surface
            .create_marker(Position::new(52.0, 4.0), &plane_icon(0.0))
            .unwrap();
        surface.set_tooltip(&id, "hello").unwrap();
        surface.update_position(&id, Position::new(52.5, 4.5)).unwrap();

        let marker = surface.marker(id).unwrap();
        assert_eq!(marker.position, Position::new(52.5, 4.5));
        assert_eq!(marker.tooltip.as_deref(), Some("hello"));

        surface.destroy(id).unwrap();
        assert_eq!(surface.live_markers(), 0);
        assert_eq!(surface.created(), 1);
        assert_eq!(surface.destroyed(), 1);
    }

    #[test]
    fn test_unknown_handle_rejected() {
        let mut surface = RecordingSurface::new();
        let err = surface.set_tooltip(&MarkerId(42), "x").unwrap_err();
        assert_eq!(err, SurfaceError::UnknownHandle("marker-42".to_string()));
    }

    #[test]
    fn test_injected_failure_applies_once() {
        let mut surface = RecordingSurface::new();
        surface.fail_next(SurfaceError::Backend("boom".to_string()));

        assert!(surface.create_marker(Position::new(0.0, 0.0), &plane_icon(0.0)).is_err());
        assert!(surface.create_marker(Position::new(0.0, 0.0), &plane_icon(0.0)).is_ok());
        assert_eq!(surface.created(), 1);
    }

    #[test]
    fn test_tooltip_failure_targets_tooltip_only() {
        let mut surface = RecordingSurface::new();
        surface.fail_next_tooltip(SurfaceError::Backend("boom".to_string()));

        let id = surface
            .create_marker(Position::new(0.0, 0.0), &plane_icon(0.0))
            .unwrap();
        surface.update_position(&id, Position::new(1.0, 1.0)).unwrap();
        assert!(surface.set_tooltip(&id, "first").is_err());
        surface.set_tooltip(&id, "second").unwrap();

        assert_eq!(surface.marker(id).unwrap().tooltip.as_deref(), Some("second"));
    }
}
