//! System handlers: health, OpenAPI, events.

use crate::api::AppState;
use crate::types::Event;
use axum::{
    Json,
    extract::State,
    response::{
        IntoResponse,
        sse::{Event as SseEvent, KeepAlive, Sse},
    },
};
use serde_json::json;
use std::convert::Infallible;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;

/// GET /health - Health check
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "system",
    responses(
        (status = 200, description = "Service is healthy")
    )
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "accepting": state.service.is_accepting(),
        "active_tasks": state.service.active_tasks().await,
        "max_active_tasks": state.config.admission.max_active_tasks,
    }))
}

/// GET /openapi.json - OpenAPI specification
#[utoipa::path(
    get,
    path = "/api/openapi.json",
    tag = "system",
    responses(
        (status = 200, description = "OpenAPI 3 specification in JSON format")
    )
)]
pub async fn openapi_spec() -> impl IntoResponse {
    use crate::api::openapi::ApiDoc;
    use utoipa::OpenApi;

    Json(ApiDoc::openapi())
}

/// GET /events - Server-sent events stream
#[utoipa::path(
    get,
    path = "/api/events",
    tag = "system",
    responses(
        (status = 200, description = "Server-sent events stream (text/event-stream)", content_type = "text/event-stream")
    )
)]
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl tokio_stream::Stream<Item = Result<SseEvent, Infallible>>> {
    let receiver = state.service.subscribe();
    let stream = BroadcastStream::new(receiver);

    let sse_stream = stream.filter_map(|result| match result {
        Ok(event) => match serde_json::to_string(&event) {
            Ok(json_data) => {
                let event_type = match &event {
                    Event::TaskCreated { .. } => "task_created",
                    Event::UrlAccepted { .. } => "url_accepted",
                    Event::ArchiveStarted { .. } => "archive_started",
                    Event::TaskCompleted { .. } => "task_completed",
                    Event::TaskFailed { .. } => "task_failed",
                    Event::Shutdown => "shutdown",
                };

                Some(Ok(SseEvent::default().event(event_type).data(json_data)))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize event to JSON");
                None
            }
        },
        Err(tokio_stream::wrappers::errors::BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::warn!(skipped, "SSE client lagged");
            Some(Ok(SseEvent::default()
                .event("error")
                .data(json!({"error": "lagged", "skipped": skipped}).to_string())))
        }
    });

    Sse::new(sse_stream).keep_alive(KeepAlive::default())
}
