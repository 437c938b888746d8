use super::ApiState;
use crate::tracker::EntityView;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

/// Query parameters for entity listing
#[derive(Deserialize)]
pub struct EntityQueryParams {
    /// Filter by entity ID prefix (string matching)
    pub prefix: Option<String>,
}

/// Error response
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Create query API router
pub fn create_query_router(state: ApiState) -> Router {
    Router::new()
        .route("/api/entities", get(list_entities))
        .route("/api/entities/:id", get(get_entity))
        .with_state(Arc::new(state))
}

/// GET /api/entities - List tracked entities, sorted by id
///
/// Query parameters:
/// - `prefix`: Filter by entity ID prefix (e.g., ?prefix=random_plane)
async fn list_entities(
    State(state): State<Arc<ApiState>>,
    Query(params): Query<EntityQueryParams>,
) -> Result<Json<Vec<EntityView>>, QueryError> {
    let mut entities: Vec<EntityView> = state
        .tracker
        .list()
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to list entities");
            QueryError::Unavailable
        })?
        .into_iter()
        .filter(|entity| match params.prefix {
            Some(ref prefix) => entity.id.as_str().starts_with(prefix.as_str()),
            None => true,
        })
        .collect();

    entities.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(Json(entities))
}

/// GET /api/entities/:id - Get specific entity
async fn get_entity(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> Result<Json<EntityView>, QueryError> {
    let entity = state
        .tracker
        .get(&id)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to get entity");
            QueryError::Unavailable
        })?
        .ok_or(QueryError::NotFound)?;

    Ok(Json(entity))
}

/// Query error types
#[derive(Debug)]
enum QueryError {
    NotFound,
    Unavailable,
}

impl IntoResponse for QueryError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            QueryError::NotFound => (StatusCode::NOT_FOUND, "Entity not found"),
            QueryError::Unavailable => (StatusCode::SERVICE_UNAVAILABLE, "Tracker is not running"),
        };

        let body = Json(ErrorResponse {
            error: error_message.to_string(),
        });

        (status, body).into_response()
    }
}
