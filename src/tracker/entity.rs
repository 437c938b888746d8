use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;

/// Latitude/longitude pair in degrees
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub lat: f64,
    pub lng: f64,
}

impl Position {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Stable external identifier of a tracked entity (never empty)
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EntityId(String);

/// Rejected entity identifier
#[derive(Debug, Clone, PartialEq)]
pub struct EmptyEntityId;

impl fmt::Display for EmptyEntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity id must not be empty")
    }
}

impl std::error::Error for EmptyEntityId {}

impl EntityId {
    pub fn new(id: impl Into<String>) -> Result<Self, EmptyEntityId> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(EmptyEntityId);
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for EntityId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for EntityId {
    type Error = EmptyEntityId;

    fn try_from(id: String) -> Result<Self, Self::Error> {
        Self::new(id)
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        EntityId::new(raw).map_err(serde::de::Error::custom)
    }
}

/// Display attributes of an entity, shallow-merged on update
pub type Metadata = HashMap<String, Value>;

/// Tracking record for one entity.
///
/// The visual handle is owned here and only reachable read-only from
/// outside the tracker.
#[derive(Debug)]
pub struct TrackedEntity<H> {
    pub(crate) id: EntityId,
    pub(crate) position: Position,
    pub(crate) heading: f64,
    pub(crate) metadata: Metadata,
    pub(crate) visual: H,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) last_updated: DateTime<Utc>,
}

impl<H> TrackedEntity<H> {
    pub fn id(&self) -> &EntityId {
        &self.id
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// Heading in degrees, in `[0, 360)`
    pub fn heading(&self) -> f64 {
        self.heading
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Opaque handle of the on-screen marker
    pub fn visual(&self) -> &H {
        &self.visual
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    /// Serializable snapshot without the visual handle
    pub fn view(&self) -> EntityView {
        EntityView {
            id: self.id.clone(),
            position: self.position,
            heading: self.heading,
            metadata: self.metadata.clone(),
            created_at: self.created_at,
            last_updated: self.last_updated,
        }
    }
}

/// Snapshot of a tracked entity, as returned by queries and reply events
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntityView {
    pub id: EntityId,
    pub position: Position,
    pub heading: f64,
    pub metadata: Metadata,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "lastUpdated")]
    pub last_updated: DateTime<Utc>,
}

/// Normalise a heading into `[0, 360)` degrees.
///
/// Non-finite headings are passed through unchanged; the tracker drops
/// them before they get here.
pub fn normalize_heading(heading: f64) -> f64 {
    if !heading.is_finite() {
        return heading;
    }
    let normalized = heading.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if normalized >= 360.0 {
        0.0
    } else {
        normalized
    }
}
