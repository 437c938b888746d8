// Live entity tracking: id → entity map mirrored onto a rendering surface

mod demo;
mod engine;
mod entity;

pub use demo::{anonymous_id, ScatterArea};
pub use engine::LiveEntityTracker;
pub use entity::{
    normalize_heading, EmptyEntityId, EntityId, EntityView, Metadata, Position, TrackedEntity,
};
