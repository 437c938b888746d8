use crate::surface::{RenderingSurface, SurfaceError};
use crate::tracker::entity::{EntityId, Metadata, Position, TrackedEntity};
use crate::tracker::LiveEntityTracker;
use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::info;

/// Rectangular area around a centre point, in degrees
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScatterArea {
    pub center: Position,
    pub lat_span: f64,
    pub lng_span: f64,
}

impl ScatterArea {
    pub fn around(center: Position, span: f64) -> Self {
        Self {
            center,
            lat_span: span,
            lng_span: span,
        }
    }

    fn sample<R: Rng>(&self, rng: &mut R) -> Position {
        let lat = self.center.lat + rng.gen_range(-0.5..=0.5) * self.lat_span;
        let lng = self.center.lng + rng.gen_range(-0.5..=0.5) * self.lng_span;
        Position::new(lat, lng)
    }
}

/// Generate an id of the form `plane_<unix millis>_<9 base36 chars>`
pub fn anonymous_id<R: Rng>(rng: &mut R) -> EntityId {
    let suffix: String = rng
        .sample_iter(Alphanumeric)
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .take(9)
        .map(char::from)
        .collect();

    let id = format!("plane_{}_{}", Utc::now().timestamp_millis(), suffix);
    EntityId::new(id).unwrap_or_else(|_| unreachable!("generated ids are never empty"))
}

impl<S: RenderingSurface> LiveEntityTracker<S> {
    /// Track an entity under a freshly generated id
    pub fn upsert_anonymous<R: Rng>(
        &mut self,
        rng: &mut R,
        position: Position,
        heading: Option<f64>,
        metadata: Metadata,
    ) -> Result<&TrackedEntity<S::Handle>, SurfaceError> {
        let id = anonymous_id(rng);
        self.upsert(id, position, heading, metadata)
    }

    /// Place `count` entities named `random_plane_1..=count` at random
    /// positions within `area`, with random headings.
    ///
    /// Ids are stable, so repeated calls move the same entities around.
    pub fn scatter<R: Rng>(
        &mut self,
        rng: &mut R,
        count: usize,
        area: ScatterArea,
    ) -> Result<Vec<EntityId>, SurfaceError> {
        let mut ids = Vec::new();
        for i in 1..=count {
            let id = EntityId::new(format!("random_plane_{}", i))
                .unwrap_or_else(|_| unreachable!("generated ids are never empty"));
            let position = area.sample(rng);
            let heading = f64::from(rng.gen_range(0u16..360));
            self.upsert(id.clone(), position, Some(heading), Metadata::new())?;
            ids.push(id);
        }

        info!(count, "Scattered random entities");
        Ok(ids)
    }
}
