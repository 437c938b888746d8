// HTTP and WebSocket APIs

mod ingestion;
pub mod query;
pub mod websocket;

pub use ingestion::create_ingestion_router;
pub use query::create_query_router;
pub use websocket::{create_ws_router, ws_handler};

use crate::transport::{BroadcastPublisher, TrackerHandle};
use axum::{response::Json, routing::get, Router};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

/// Shared state for every API router
#[derive(Clone)]
pub struct ApiState {
    /// Handle to the tracker event loop
    pub tracker: TrackerHandle,
    /// Response events from tracker handlers
    pub publisher: BroadcastPublisher,
}

/// Assemble the full application router
pub fn create_app(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(create_ingestion_router(state.clone()))
        .merge(create_query_router(state.clone()))
        .merge(create_ws_router(state))
        .layer(CorsLayer::permissive())
}

/// GET /health
async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
