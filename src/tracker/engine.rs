use crate::render::{flight_tooltip, plane_icon};
use crate::surface::{ReadyGate, RenderingSurface, SurfaceError};
use crate::tracker::entity::{
    normalize_heading, EntityId, EntityView, Metadata, Position, TrackedEntity,
};
use chrono::Utc;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Tracks live entities by id and mirrors them onto a rendering surface.
///
/// The id map is the single source of truth: every entity owns exactly
/// one visual, created on first upsert and destroyed on remove/clear.
pub struct LiveEntityTracker<S: RenderingSurface> {
    surface: S,
    entities: HashMap<EntityId, TrackedEntity<S::Handle>>,
}

impl<S: RenderingSurface> LiveEntityTracker<S> {
    /// Create a tracker drawing onto an already initialised surface
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            entities: HashMap::new(),
        }
    }

    /// Wait for the surface to become ready, then create the tracker.
    ///
    /// Fails with `SurfaceError::NotReady` if the gate does not open
    /// within `timeout`.
    pub async fn attach(
        surface: S,
        mut gate: ReadyGate,
        timeout: Duration,
    ) -> Result<Self, SurfaceError> {
        gate.wait(timeout).await?;
        Ok(Self::new(surface))
    }

    /// Insert or update an entity.
    ///
    /// New ids get a marker with an icon built from `heading` (0 when
    /// absent) and a tooltip built from `metadata`. Known ids are moved,
    /// get a new icon only when the heading changed, and have `metadata`
    /// merged into what is already stored. A `None` or non-finite heading
    /// on update keeps the stored heading.
    pub fn upsert(
        &mut self,
        id: EntityId,
        position: Position,
        heading: Option<f64>,
        metadata: Metadata,
    ) -> Result<&TrackedEntity<S::Handle>, SurfaceError> {
        let now = Utc::now();
        let heading = heading.filter(|h| h.is_finite()).map(normalize_heading);

        if let Some(entity) = self.entities.get_mut(&id) {
            Self::apply_update(&mut self.surface, entity, position, heading, metadata)?;
            entity.last_updated = now;
        } else {
            let entity = self.create_entity(id.clone(), position, heading.unwrap_or(0.0), metadata)?;
            self.entities.insert(id.clone(), entity);
        }

        Ok(&self.entities[&id])
    }

    fn create_entity(
        &mut self,
        id: EntityId,
        position: Position,
        heading: f64,
        metadata: Metadata,
    ) -> Result<TrackedEntity<S::Handle>, SurfaceError> {
        let visual = self.surface.create_marker(position, &plane_icon(heading))?;

        let tooltip = flight_tooltip(id.as_str(), &metadata);
        if let Err(e) = self.surface.set_tooltip(&visual, &tooltip) {
            // Don't leave an untracked marker behind
            if let Err(cleanup) = self.surface.destroy(visual) {
                warn!(entity_id = %id, error = %cleanup, "Failed to destroy marker after tooltip error");
            }
            return Err(e);
        }

        debug!(entity_id = %id, lat = position.lat, lng = position.lng, heading, "Entity created");

        let now = Utc::now();
        Ok(TrackedEntity {
            id,
            position,
            heading,
            metadata,
            visual,
            created_at: now,
            last_updated: now,
        })
    }

    fn apply_update(
        surface: &mut S,
        entity: &mut TrackedEntity<S::Handle>,
        position: Position,
        heading: Option<f64>,
        metadata: Metadata,
    ) -> Result<(), SurfaceError> {
        surface.update_position(&entity.visual, position)?;
        entity.position = position;

        if let Some(heading) = heading {
            if heading != entity.heading {
                surface.set_icon(&entity.visual, &plane_icon(heading))?;
                entity.heading = heading;
            }
        }

        let mut merged = entity.metadata.clone();
        merged.extend(metadata);
        let tooltip = flight_tooltip(entity.id.as_str(), &merged);
        surface.set_tooltip(&entity.visual, &tooltip)?;
        entity.metadata = merged;
        Ok(())
    }

    /// Remove an entity and destroy its marker.
    ///
    /// Returns `Ok(false)` for an unknown id without touching anything.
    pub fn remove(&mut self, id: &str) -> Result<bool, SurfaceError> {
        let Some(entity) = self.entities.remove(id) else {
            debug!(entity_id = %id, "Remove of untracked entity ignored");
            return Ok(false);
        };

        self.surface.destroy(entity.visual)?;
        info!(entity_id = %id, "Entity removed");
        Ok(true)
    }

    /// Look up an entity by id
    pub fn get(&self, id: &str) -> Option<&TrackedEntity<S::Handle>> {
        self.entities.get(id)
    }

    /// All tracked ids, in no particular order
    pub fn list_ids(&self) -> Vec<EntityId> {
        self.entities.keys().cloned().collect()
    }

    /// Snapshots of all tracked entities
    pub fn views(&self) -> Vec<EntityView> {
        self.entities.values().map(TrackedEntity::view).collect()
    }

    /// Destroy every marker and forget every entity.
    ///
    /// The map is emptied even when the surface fails to destroy a
    /// marker; the first such error is returned after all markers were
    /// attempted. Returns how many entities were dropped.
    pub fn clear(&mut self) -> Result<usize, SurfaceError> {
        let count = self.entities.len();
        let mut first_error = None;

        for (id, entity) in self.entities.drain() {
            if let Err(e) = self.surface.destroy(entity.visual) {
                warn!(entity_id = %id, error = %e, "Failed to destroy marker during clear");
                first_error.get_or_insert(e);
            }
        }

        info!(count, "Cleared all entities");

        match first_error {
            Some(e) => Err(e),
            None => Ok(count),
        }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Read-only access to the rendering surface
    pub fn surface(&self) -> &S {
        &self.surface
    }

    #[cfg(test)]
    pub(crate) fn surface_mut_for_tests(&mut self) -> &mut S {
        &mut self.surface
    }
}

impl<S: RenderingSurface + Default> Default for LiveEntityTracker<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}
