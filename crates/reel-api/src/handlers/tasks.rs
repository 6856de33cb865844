//! Task creation, resume, and status polling handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use reel_models::{TaskId, VideoTask};
use reel_provider::GenerationOptions;
use reel_queue::{GenerateVideoJob, QueueJob};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateTaskRequest {
    pub user_id: String,
    /// Explicit generation prompt; wins over the summary
    pub prompt: Option<String>,
    /// Narrative summary the prompt is derived from when absent
    pub summary: Option<String>,
    /// Provider generation knobs
    pub options: Option<GenerationOptions>,
}

#[derive(Serialize)]
pub struct TaskAccepted {
    pub task_id: String,
    pub status: String,
}

#[derive(Serialize)]
pub struct TaskStatusResponse {
    pub status: String,
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Create a task record and dispatch generation.
pub async fn create_task(
    State(state): State<AppState>,
    Json(request): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskAccepted>)> {
    if request.user_id.trim().is_empty() {
        return Err(ApiError::bad_request("user_id is required"));
    }

    let has_prompt = request.prompt.as_deref().is_some_and(|p| !p.trim().is_empty());
    let has_summary = request
        .summary
        .as_deref()
        .is_some_and(|s| !s.trim().is_empty());
    if !has_prompt && !has_summary {
        return Err(ApiError::bad_request("Provide a prompt or a summary"));
    }

    let mut task = VideoTask::new(request.user_id.trim());
    if let Some(prompt) = request.prompt.filter(|p| !p.trim().is_empty()) {
        task = task.with_prompt(prompt);
    }
    if let Some(summary) = request.summary.filter(|s| !s.trim().is_empty()) {
        task = task.with_summary(summary);
    }
    if let Some(options) = request.options {
        let value = serde_json::to_value(options)
            .map_err(|e| ApiError::internal(format!("Invalid generation options: {}", e)))?;
        task.set_metadata("options", value);
    }

    state.store.create(&task).await?;

    state
        .queue
        .enqueue(&QueueJob::GenerateVideo(GenerateVideoJob::new(
            task.id.clone(),
        )))
        .await?;

    info!("Created task {} for user {}", task.id, task.user_id);

    Ok((
        StatusCode::ACCEPTED,
        Json(TaskAccepted {
            task_id: task.id.to_string(),
            status: task.status.to_string(),
        }),
    ))
}

/// Re-dispatch an existing task.
///
/// The orchestrator decides what resuming means: terminal tasks are
/// no-ops, healthy running tasks stay owned by their worker, and stuck
/// tasks are reset and reprocessed.
pub async fn resume_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> ApiResult<(StatusCode, Json<TaskAccepted>)> {
    let id = TaskId::from_string(task_id);

    let task = state
        .store
        .load(&id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Task {} not found", id)))?;

    state
        .queue
        .enqueue(&QueueJob::GenerateVideo(GenerateVideoJob::new(id.clone())))
        .await?;

    info!("Re-dispatched task {}", id);

    Ok((
        StatusCode::ACCEPTED,
        Json(TaskAccepted {
            task_id: task.id.to_string(),
            status: task.status.to_string(),
        }),
    ))
}

/// Status read accessor for polling UIs.
///
/// Consumers only ever see persisted state; a failed task shows up as
/// `failed` with its message, never as an exception.
pub async fn get_task_status(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> ApiResult<Json<TaskStatusResponse>> {
    let id = TaskId::from_string(task_id);

    let task = state
        .store
        .load(&id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Task {} not found", id)))?;

    Ok(Json(TaskStatusResponse {
        status: task.status.to_string(),
        progress: task.progress,
        video_url: task.video_url,
        error: task.error_message,
    }))
}
