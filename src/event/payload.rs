use crate::tracker::{EntityId, Metadata};
use serde::Deserialize;

/// Event names understood by the tracker, inbound and outbound
pub mod names {
    pub const UPSERT_ENTITY: &str = "upsert_entity";
    pub const ADD_ENTITY: &str = "add_entity";
    pub const REMOVE_ENTITY: &str = "remove_entity";
    pub const CLEAR_ENTITIES: &str = "clear_entities";
    pub const LIST_ENTITIES: &str = "list_entities";
    pub const GET_ENTITY: &str = "get_entity";
    pub const SCATTER_ENTITIES: &str = "scatter_entities";

    pub const ENTITY_UPSERTED: &str = "entity_upserted";
    pub const ENTITY_REMOVED: &str = "entity_removed";
    pub const ENTITIES_CLEARED: &str = "entities_cleared";
    pub const ENTITY_IDS: &str = "entity_ids";
    pub const ENTITY: &str = "entity";
    pub const ENTITIES_SCATTERED: &str = "entities_scattered";
}

/// `upsert_entity`: insert or update one entity
///
/// ```json
/// { "id": "A1", "lat": 52.1, "lng": 4.5, "heading": 90, "metadata": { "flightNumber": "KL123" } }
/// ```
///
/// `direction` and `data` are accepted as aliases of `heading` and `metadata`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertPayload {
    pub id: EntityId,
    pub lat: f64,
    pub lng: f64,
    #[serde(default, alias = "direction")]
    pub heading: Option<f64>,
    #[serde(default, alias = "data")]
    pub metadata: Metadata,
}

/// `add_entity`: track an entity under a generated id
#[derive(Debug, Clone, Deserialize)]
pub struct AnonymousPayload {
    pub lat: f64,
    pub lng: f64,
    #[serde(default, alias = "direction")]
    pub heading: Option<f64>,
    #[serde(default, alias = "data")]
    pub metadata: Metadata,
}

/// `remove_entity`
#[derive(Debug, Clone, Deserialize)]
pub struct RemovePayload {
    pub id: String,
}

/// `get_entity`
#[derive(Debug, Clone, Deserialize)]
pub struct GetPayload {
    pub id: String,
}

/// `scatter_entities`: place random entities around the map centre
#[derive(Debug, Clone, Deserialize)]
pub struct ScatterPayload {
    #[serde(default = "default_scatter_count")]
    pub count: usize,
}

fn default_scatter_count() -> usize {
    10
}
