//! Task API handlers.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use taskproc_core::{
    CompletionOutcome, OrchestratorError, Task, TaskData, TaskPriority, TaskStatus,
};
use tracing::{debug, error, warn};

use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating a task
#[derive(Debug, Deserialize)]
pub struct CreateTaskBody {
    /// Caller-chosen id; a UUID v4 is generated when absent
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    /// 1 (low), 2 (medium) or 3 (high); defaults to medium
    pub priority: Option<i64>,
    pub data: TaskData,
}

impl CreateTaskBody {
    fn into_task(self) -> Result<Task, taskproc_core::ValidationError> {
        let priority = match self.priority {
            Some(value) => TaskPriority::try_from(value)?,
            None => TaskPriority::default(),
        };
        let id = self
            .id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        Ok(Task::new(id, self.title, priority, self.data))
    }
}

#[derive(Debug, Serialize)]
pub struct CreateTaskResponse {
    pub task_id: String,
    pub status: TaskStatus,
    pub message: String,
}

/// Task snapshot as returned by lookups
#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub id: String,
    pub title: String,
    pub priority: TaskPriority,
    pub created_at: String,
    pub data: TaskData,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            title: task.title,
            priority: task.priority,
            created_at: task.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            data: task.data,
            status: task.status,
            result: task.result.filter(|r| !r.is_empty()),
            error: task.error_message.filter(|e| !e.is_empty()),
            completed_at: task
                .completed_at
                .map(|at| at.to_rfc3339_opts(SecondsFormat::Secs, true)),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CompleteTaskResponse {
    pub task_id: String,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    pub message: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct TaskErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl TaskErrorResponse {
    fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            task_id: None,
            current_status: None,
            reason: None,
        }
    }
}

type ApiError = (StatusCode, Json<TaskErrorResponse>);

fn api_error(status: StatusCode, error: impl Into<String>) -> ApiError {
    (status, Json(TaskErrorResponse::new(error)))
}

// ============================================================================
// Handlers
// ============================================================================

/// Create a new task
pub async fn create_task(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CreateTaskBody>, JsonRejection>,
) -> Result<Json<CreateTaskResponse>, ApiError> {
    let Json(body) = body.map_err(|rejection| {
        debug!("Malformed create request: {}", rejection.body_text());
        api_error(
            StatusCode::BAD_REQUEST,
            format!("Invalid input: {}", rejection.body_text()),
        )
    })?;

    let task = body
        .into_task()
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, format!("Invalid input: {}", e)))?;

    match state.orchestrator().create_task(task) {
        Ok(task_id) => Ok(Json(CreateTaskResponse {
            task_id,
            status: TaskStatus::Pending,
            message: "Task created successfully".to_string(),
        })),
        Err(OrchestratorError::Validation(e)) => Err(api_error(
            StatusCode::BAD_REQUEST,
            format!("Invalid input: {}", e),
        )),
        Err(OrchestratorError::NotRunning) => {
            warn!("Task creation refused: orchestrator is not running");
            Err(api_error(
                StatusCode::SERVICE_UNAVAILABLE,
                "Orchestrator is not running",
            ))
        }
        Err(e) => {
            error!("Failed to create task: {}", e);
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Internal server error: {}", e),
            ))
        }
    }
}

/// Get a task snapshot by id
pub async fn get_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TaskResponse>, ApiError> {
    state
        .orchestrator()
        .get_task(&id)
        .map(|task| Json(TaskResponse::from(task)))
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Task not found"))
}

/// Mark a processed task as completed
pub async fn complete_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CompleteTaskResponse>, ApiError> {
    match state.orchestrator().complete_task(&id) {
        CompletionOutcome::Completed(task) => Ok(Json(CompleteTaskResponse {
            task_id: task.id,
            status: task.status,
            result: task.result,
            message: "Task marked as completed".to_string(),
        })),
        CompletionOutcome::NotCompletable(current) => Err((
            StatusCode::BAD_REQUEST,
            Json(TaskErrorResponse {
                error: "Task cannot be completed".to_string(),
                task_id: Some(id),
                current_status: Some(current),
                reason: Some(
                    "Task must be in processing state with result to be completed".to_string(),
                ),
            }),
        )),
        CompletionOutcome::NotFound => Err(api_error(StatusCode::NOT_FOUND, "Task not found")),
    }
}
