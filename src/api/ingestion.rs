use super::ApiState;
use crate::event::InboundEvent;
use crate::transport::TransportError;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::post,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Accepted event response
#[derive(Serialize)]
struct EventResponse {
    #[serde(rename = "eventId")]
    event_id: String,
    event: String,
}

/// Error response
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Batch request
#[derive(Deserialize)]
struct BatchRequest {
    events: Vec<InboundEvent>,
}

/// Batch response
#[derive(Serialize)]
struct BatchResponse {
    accepted: usize,
    failed: usize,
    results: Vec<BatchResult>,
}

#[derive(Serialize)]
struct BatchResult {
    #[serde(rename = "eventId")]
    event_id: Option<String>,
    event: String,
    error: Option<String>,
}

/// Create router with event ingestion endpoints
pub fn create_ingestion_router(state: ApiState) -> Router {
    Router::new()
        .route("/api/events", post(push_event))
        .route("/api/events/batch", post(push_batch))
        .with_state(Arc::new(state))
}

/// POST /api/events - Queue a single event for the tracker
async fn push_event(
    State(state): State<Arc<ApiState>>,
    Json(mut event): Json<InboundEvent>,
) -> Result<(StatusCode, Json<EventResponse>), AppError> {
    event
        .validate_and_prepare()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let event_id = event.event_id.clone().unwrap_or_default();
    let name = event.event.clone();

    info!(event_id = %event_id, event = %name, "Ingesting event");

    state.tracker.push(event)?;

    Ok((
        StatusCode::ACCEPTED,
        Json(EventResponse {
            event_id,
            event: name,
        }),
    ))
}

/// POST /api/events/batch - Queue multiple events, in order
async fn push_batch(
    State(state): State<Arc<ApiState>>,
    Json(mut request): Json<BatchRequest>,
) -> Result<Json<BatchResponse>, AppError> {
    if request.events.is_empty() {
        return Err(AppError::ValidationError(
            "Batch request must contain at least one event".to_string(),
        ));
    }

    info!(count = request.events.len(), "Ingesting event batch");

    let mut results = Vec::with_capacity(request.events.len());
    let mut accepted = 0;
    let mut failed = 0;

    for mut event in request.events.drain(..) {
        if let Err(e) = event.validate_and_prepare() {
            failed += 1;
            results.push(BatchResult {
                event_id: None,
                event: event.event,
                error: Some(format!("validation failed: {}", e)),
            });
            continue;
        }

        let event_id = event.event_id.clone();
        let name = event.event.clone();
        match state.tracker.push(event) {
            Ok(()) => {
                accepted += 1;
                results.push(BatchResult {
                    event_id,
                    event: name,
                    error: None,
                });
            }
            Err(e) => {
                warn!(error = %e, event = %name, "Failed to queue event");
                failed += 1;
                results.push(BatchResult {
                    event_id,
                    event: name,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    Ok(Json(BatchResponse {
        accepted,
        failed,
        results,
    }))
}

/// Application error types
enum AppError {
    ValidationError(String),
    QueueFull,
    Unavailable,
}

impl From<TransportError> for AppError {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::QueueFull => AppError::QueueFull,
            TransportError::Closed => AppError::Unavailable,
            TransportError::Serialization(msg) => AppError::ValidationError(msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::QueueFull => {
                let body = Json(ErrorResponse {
                    error: "event queue is full".to_string(),
                });
                let mut resp = (StatusCode::SERVICE_UNAVAILABLE, body).into_response();
                resp.headers_mut().insert(
                    axum::http::header::RETRY_AFTER,
                    axum::http::HeaderValue::from_static("1"),
                );
                resp
            }
            AppError::Unavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse {
                    error: "tracker is not running".to_string(),
                }),
            )
                .into_response(),
            AppError::ValidationError(msg) => {
                (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: msg })).into_response()
            }
        }
    }
}
