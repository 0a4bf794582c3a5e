//! Task handlers.

use super::{AddUrlRequest, CreateTaskRequest};
use crate::api::AppState;
use crate::error::{Error, Result};
use crate::types::TaskId;
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};

/// Ids that do not parse are reported like unknown ones
fn parse_task_id(raw: &str) -> Result<TaskId> {
    raw.parse().map_err(|_| Error::NotFound(raw.to_string()))
}

/// POST /tasks - Create a task
#[utoipa::path(
    post,
    path = "/api/tasks",
    tag = "tasks",
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Task created", body = crate::types::TaskView),
        (status = 400, description = "Missing or empty name", body = crate::error::ApiError),
        (status = 429, description = "Too many active tasks", body = crate::error::ApiError),
        (status = 503, description = "Shutting down", body = crate::error::ApiError)
    )
)]
pub async fn create_task(
    State(state): State<AppState>,
    body: std::result::Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(request) = body?;
    let task = state.service.create_task(&request.name).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// GET /tasks - List all tasks
#[utoipa::path(
    get,
    path = "/api/tasks",
    tag = "tasks",
    responses(
        (status = 200, description = "All tasks, oldest first", body = Vec<crate::types::TaskView>)
    )
)]
pub async fn list_tasks(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.service.list_tasks().await)
}

/// GET /tasks/:id - Get a single task
#[utoipa::path(
    get,
    path = "/api/tasks/{id}",
    tag = "tasks",
    params(
        ("id" = String, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Task details", body = crate::types::TaskView),
        (status = 404, description = "Task not found", body = crate::error::ApiError)
    )
)]
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let id = parse_task_id(&id)?;
    Ok(Json(state.service.get_task(id).await?))
}

/// POST /tasks/:id/urls - Attach a source URL
#[utoipa::path(
    post,
    path = "/api/tasks/{id}/urls",
    tag = "tasks",
    params(
        ("id" = String, Path, description = "Task ID")
    ),
    request_body = AddUrlRequest,
    responses(
        (status = 204, description = "URL accepted"),
        (status = 400, description = "Malformed URL or body", body = crate::error::ApiError),
        (status = 404, description = "Task not found", body = crate::error::ApiError),
        (status = 415, description = "Content is not a PDF or JPEG", body = crate::error::ApiError),
        (status = 422, description = "Task full or URL unreachable", body = crate::error::ApiError)
    )
)]
pub async fn add_url(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: std::result::Result<Json<AddUrlRequest>, JsonRejection>,
) -> Result<StatusCode> {
    let id = parse_task_id(&id)?;
    let Json(request) = body?;
    state.service.add_url(id, &request.url).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /tasks/:id/status - Get task status
#[utoipa::path(
    get,
    path = "/api/tasks/{id}/status",
    tag = "tasks",
    params(
        ("id" = String, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Current status", body = crate::types::StatusView),
        (status = 404, description = "Task not found", body = crate::error::ApiError)
    )
)]
pub async fn get_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let id = parse_task_id(&id)?;
    Ok(Json(state.service.get_status(id).await?))
}
