//! Task handlers: creation, URL submission and status.

use crate::api::AppState;
use crate::error::{ApiError, Error, Result};
use crate::types::{SubmitUrlsRequest, TaskCreated, TaskId};
use axum::{
    Json,
    body::Bytes,
    extract::{Path, Request, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use tower::ServiceExt;
use tower_http::services::ServeFile;

/// Parse the `:id` path segment, reporting garbage as a client error
fn parse_task_id(raw: &str) -> Result<TaskId> {
    raw.parse()
        .map_err(|_| Error::InvalidTaskId(raw.to_string()))
}

/// GET /CreateTask - Create a new task
#[utoipa::path(
    get,
    path = "/CreateTask",
    tag = "tasks",
    responses(
        (status = 201, description = "Task created", body = TaskCreated),
        (status = 500, description = "Archive could not be created", body = crate::error::ApiError),
        (status = 503, description = "Too many tasks still downloading", body = crate::error::ApiError)
    )
)]
pub async fn create_task(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let task = state.registry.create_task().await?;

    let created = TaskCreated {
        task_id: task.id(),
        message: format!("Task with id {} created", task.id()),
        archive: task.archive_file_name(),
        created_at: task.created_at(),
    };

    Ok((StatusCode::CREATED, Json(created)))
}

/// POST /task/:id/download - Submit URLs to a task
///
/// Responds 202 when at least one URL started downloading and 400 when every
/// URL was rejected. Both carry the per-URL outcome.
#[utoipa::path(
    post,
    path = "/task/{id}/download",
    tag = "tasks",
    params(
        ("id" = u64, Path, description = "Task ID")
    ),
    request_body = SubmitUrlsRequest,
    responses(
        (status = 202, description = "URLs accepted", body = crate::types::SubmitOutcome),
        (status = 400, description = "Bad id, bad body, quota exceeded or all URLs rejected"),
        (status = 404, description = "Task not found", body = crate::error::ApiError)
    )
)]
pub async fn submit_urls(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse> {
    let id = parse_task_id(&id)?;
    let task = state.registry.get_task(id).await?;

    let request: SubmitUrlsRequest = serde_json::from_slice(&body)
        .map_err(|e| Error::InvalidRequest(format!("invalid request body: {}", e)))?;
    let outcome = task.accept_urls(request.urls).await?;

    let status = if outcome.any_accepted() {
        StatusCode::ACCEPTED
    } else {
        StatusCode::BAD_REQUEST
    };

    Ok((status, Json(outcome)))
}

/// GET /task/:id/status - Plain-text status of a task
///
/// Once every file of a full task is finished the archive is finalized and a
/// retrieval link is appended.
#[utoipa::path(
    get,
    path = "/task/{id}/status",
    tag = "tasks",
    params(
        ("id" = u64, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Status report", body = String, content_type = "text/plain"),
        (status = 400, description = "Invalid task ID", body = crate::error::ApiError),
        (status = 404, description = "Task not found", body = crate::error::ApiError)
    )
)]
pub async fn task_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let id = parse_task_id(&id)?;
    let task = state.registry.get_task(id).await?;
    let report = task.status().await?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        report,
    ))
}

/// GET /archives/:archive - Download an archive
///
/// Only `Archiv<id>.zip` names are served from the archive directory. The
/// archive of a live task is withheld until the task has finalized it.
#[utoipa::path(
    get,
    path = "/archives/{archive}",
    tag = "tasks",
    params(
        ("archive" = String, Path, description = "Archive file name, e.g. Archiv1.zip")
    ),
    responses(
        (status = 200, description = "ZIP archive", content_type = "application/zip"),
        (status = 404, description = "No such archive, or not finalized yet", body = crate::error::ApiError)
    )
)]
pub async fn download_archive(
    State(state): State<AppState>,
    Path(archive): Path<String>,
    request: Request,
) -> Response {
    let not_found = |archive: &str| {
        (
            StatusCode::NOT_FOUND,
            Json(ApiError::not_found(format!("archive {}", archive))),
        )
            .into_response()
    };

    let Some(id) = TaskId::from_archive_file_name(&archive) else {
        return not_found(&archive);
    };

    if let Ok(task) = state.registry.get_task(id).await
        && !task.is_closed().await
    {
        tracing::debug!(task_id = id.get(), "archive requested before it was finalized");
        return not_found(&archive);
    }

    let path = state.config.archive_dir().join(&archive);
    match ServeFile::new(path).oneshot(request).await {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    }
}
