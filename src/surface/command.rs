use super::{
    readiness, MarkerId, ReadyGate, ReadySignal, RenderingSurface, SceneReplay, SurfaceError,
};
use crate::render::Icon;
use crate::tracker::Position;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Initial map view sent to viewers before any marker
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapView {
    pub center: Position,
    pub zoom: u8,
    pub tile_url: String,
    pub attribution: String,
}

/// Draw command streamed to map viewers
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MarkerCommand {
    MapInit {
        #[serde(flatten)]
        view: MapView,
    },
    CreateMarker {
        marker_id: MarkerId,
        position: Position,
        icon: Icon,
    },
    MoveMarker {
        marker_id: MarkerId,
        position: Position,
    },
    SetIcon {
        marker_id: MarkerId,
        icon: Icon,
    },
    SetTooltip {
        marker_id: MarkerId,
        text: String,
    },
    DestroyMarker {
        marker_id: MarkerId,
    },
}

#[derive(Clone, Debug)]
struct SceneMarker {
    position: Position,
    icon: Icon,
    tooltip: Option<String>,
}

/// Surface that turns every draw call into a [`MarkerCommand`] broadcast.
///
/// Keeps its own scene of live markers so a viewer joining late can be
/// brought up to date with [`SceneReplay::replay`].
pub struct CommandSurface {
    tx: broadcast::Sender<MarkerCommand>,
    next_id: u64,
    view: Option<MapView>,
    scene: HashMap<MarkerId, SceneMarker>,
    ready: ReadySignal,
}

impl CommandSurface {
    /// Create a surface broadcasting on a channel of `capacity` commands.
    ///
    /// The returned gate opens once [`CommandSurface::initialize`] runs.
    pub fn new(capacity: usize) -> (Self, ReadyGate) {
        let (tx, _) = broadcast::channel(capacity);
        let (ready, gate) = readiness();
        let surface = Self {
            tx,
            next_id: 0,
            view: None,
            scene: HashMap::new(),
            ready,
        };
        (surface, gate)
    }

    /// Announce the map view to viewers and mark the surface ready
    pub fn initialize(&mut self, view: MapView) {
        info!(
            lat = view.center.lat,
            lng = view.center.lng,
            zoom = view.zoom,
            "Map initialized, ready for markers"
        );
        self.emit(MarkerCommand::MapInit { view: view.clone() });
        self.view = Some(view);
        self.ready.mark_ready();
    }

    pub fn live_markers(&self) -> usize {
        self.scene.len()
    }

    fn emit(&self, command: MarkerCommand) {
        // No viewers connected is fine
        if self.tx.send(command).is_err() {
            debug!("No viewers for draw command");
        }
    }

    fn live_mut(&mut self, id: &MarkerId) -> Result<&mut SceneMarker, SurfaceError> {
        self.scene
            .get_mut(id)
            .ok_or_else(|| SurfaceError::UnknownHandle(id.to_string()))
    }
}

impl SceneReplay for CommandSurface {
    /// Map view first, then markers in creation order
    fn replay(&self) -> Vec<MarkerCommand> {
        let mut commands = Vec::with_capacity(self.scene.len() * 2 + 1);
        if let Some(view) = &self.view {
            commands.push(MarkerCommand::MapInit { view: view.clone() });
        }

        let mut ids: Vec<&MarkerId> = self.scene.keys().collect();
        ids.sort();
        for id in ids {
            let marker = &self.scene[id];
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

impl RenderingSurface for CommandSurface {
    type Handle = MarkerId;

    fn create_marker(&mut self, position: Position, icon: &Icon) -> Result<MarkerId, SurfaceError> {
        self.next_id += 1;
        let marker_id = MarkerId(self.next_id);
        self.scene.insert(
            marker_id,
            SceneMarker {
                position,
                icon: icon.clone(),
                tooltip: None,
            },
        );
        self.emit(MarkerCommand::CreateMarker {
            marker_id,
            position,
            icon: icon.clone(),
        });
        Ok(marker_id)
    }

    fn update_position(&mut self, handle: &MarkerId, position: Position) -> Result<(), SurfaceError> {
        self.live_mut(handle)?.position = position;
        self.emit(MarkerCommand::MoveMarker {
            marker_id: *handle,
            position,
        });
        Ok(())
    }

    fn set_icon(&mut self, handle: &MarkerId, icon: &Icon) -> Result<(), SurfaceError> {
        self.live_mut(handle)?.icon = icon.clone();
        self.emit(MarkerCommand::SetIcon {
            marker_id: *handle,
            icon: icon.clone(),
        });
        Ok(())
    }

    fn set_tooltip(&mut self, handle: &MarkerId, text: &str) -> Result<(), SurfaceError> {
        self.live_mut(handle)?.tooltip = Some(text.to_string());
        self.emit(MarkerCommand::SetTooltip {
            marker_id: *handle,
            text: text.to_string(),
        });
        Ok(())
    }

    fn destroy(&mut self, handle: MarkerId) -> Result<(), SurfaceError> {
        self.scene
            .remove(&handle)
            .ok_or_else(|| SurfaceError::UnknownHandle(handle.to_string()))?;
        self.emit(MarkerCommand::DestroyMarker { marker_id: handle });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::plane_icon;
    use crate::surface::SceneSnapshot;
    use serde_json::json;

    fn leiden() -> MapView {
        MapView {
            center: Position::new(52.1518, 4.4811),
            zoom: 12,
            tile_url: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            attribution: "OpenStreetMap contributors".to_string(),
        }
    }

    #[test]
    fn test_initialize_opens_gate_and_broadcasts_view() {
        let (mut surface, gate) = CommandSurface::new(16);
        let mut rx = surface.subscribe();
        assert!(!gate.is_ready());

        surface.initialize(leiden());

        assert!(gate.is_ready());
        assert_eq!(rx.try_recv().unwrap(), MarkerCommand::MapInit { view: leiden() });
    }

    #[test]
    fn test_draw_calls_become_commands() {
        let (mut surface, _gate) = CommandSurface::new(16);
        let mut rx = surface.subscribe();

        let id = surface
            .create_marker(Position::new(52.0, 4.0), &plane_icon(45.0))
            .unwrap();
        surface.update_position(&id, Position::new(52.1, 4.1)).unwrap();
        surface.destroy(id).unwrap();

        assert!(matches!(rx.try_recv().unwrap(), MarkerCommand::CreateMarker { .. }));
        assert_eq!(
            rx.try_recv().unwrap(),
            MarkerCommand::MoveMarker {
                marker_id: id,
                position: Position::new(52.1, 4.1)
            }
        );
        assert_eq!(rx.try_recv().unwrap(), MarkerCommand::DestroyMarker { marker_id: id });
        assert_eq!(surface.live_markers(), 0);
    }

    #[test]
    fn test_unknown_handle_rejected() {
        let (mut surface, _gate) = CommandSurface::new(16);
        let id = surface
            .create_marker(Position::new(0.0, 0.0), &plane_icon(0.0))
            .unwrap();
        surface.destroy(id).unwrap();

        assert!(matches!(
            surface.set_icon(&id, &plane_icon(10.0)),
            Err(SurfaceError::UnknownHandle(_))
        ));
        assert!(surface.destroy(id).is_err());
    }

    #[test]
    fn test_replay_rebuilds_scene() {
        let (mut surface, _gate) = CommandSurface::new(16);
        surface.initialize(leiden());
        let first = surface
            .create_marker(Position::new(52.0, 4.0), &plane_icon(0.0))
            .unwrap();
        surface.set_tooltip(&first, "KL123").unwrap();
        let second = surface
            .create_marker(Position::new(52.2, 4.2), &plane_icon(90.0))
            .unwrap();
        surface.update_position(&second, Position::new(52.3, 4.3)).unwrap();

        let replay = surface.replay();
        assert_eq!(replay.len(), 4);
        assert!(matches!(replay[0], MarkerCommand::MapInit { .. }));
        assert_eq!(
            replay[2],
            MarkerCommand::SetTooltip {
                marker_id: first,
                text: "KL123".to_string()
            }
        );
        match &replay[3] {
            MarkerCommand::CreateMarker { marker_id, position, .. } => {
                assert_eq!(*marker_id, second);
                assert_eq!(*position, Position::new(52.3, 4.3));
            }
            other => panic!("Expected CreateMarker, got {:?}", other),
        }
    }

    #[test]
    fn test_snapshot_stream_continues_after_replay() {
        let (mut surface, _gate) = CommandSurface::new(16);
        surface.initialize(leiden());
        let first = surface
            .create_marker(Position::new(52.0, 4.0), &plane_icon(0.0))
            .unwrap();

        let SceneSnapshot { commands, mut updates } = surface.snapshot();
        assert_eq!(commands.len(), 2);
        // Everything drawn before the snapshot is only in the replay
        assert!(updates.try_recv().is_err());

        surface.destroy(first).unwrap();
        assert_eq!(
            updates.try_recv().unwrap(),
            MarkerCommand::DestroyMarker { marker_id: first }
        );
    }

    #[test]
    fn test_command_wire_format() {
        let value = serde_json::to_value(MarkerCommand::MoveMarker {
            marker_id: MarkerId(3),
            position: Position::new(1.5, 2.5),
        })
        .unwrap();
        assert_eq!(
            value,
            json!({ "type": "move_marker", "marker_id": 3, "position": { "lat": 1.5, "lng": 2.5 } })
        );

        let init = serde_json::to_value(MarkerCommand::MapInit { view: leiden() }).unwrap();
        assert_eq!(init["type"], "map_init");
        assert_eq!(init["zoom"], 12);
    }
}
