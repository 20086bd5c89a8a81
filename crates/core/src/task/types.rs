//! Core task data types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calc::Operation;

use super::validate::ValidationError;

/// The only task type currently understood by workers.
pub const CALCULATION_TASK_TYPE: &str = "calculation";

/// Errors raised by illegal status transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    #[error("cannot {operation} task {task_id}: current status is {current}")]
    InvalidTransition {
        task_id: String,
        current: TaskStatus,
        operation: &'static str,
    },
}

/// Task priority.
///
/// Informational only: workers dispatch strictly in arrival order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub enum TaskPriority {
    Low = 1,
    #[default]
    Medium = 2,
    High = 3,
}

impl TryFrom<i64> for TaskPriority {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(TaskPriority::Low),
            2 => Ok(TaskPriority::Medium),
            3 => Ok(TaskPriority::High),
            other => Err(ValidationError::InvalidPriority(other)),
        }
    }
}

impl From<TaskPriority> for u8 {
    fn from(priority: TaskPriority) -> Self {
        priority as u8
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", *self as u8)
    }
}

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Queued, not yet picked up by a processing thread.
    #[default]
    Pending,
    /// Calculation ran; waiting for an explicit completion request.
    Processing,
    /// Completed by an explicit request.
    Completed,
    /// The calculation raised an error.
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Processing => "processing",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }

    /// Returns true if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The computation a task requests.
///
/// `task_type` and `operation` are kept as raw strings so that unsupported
/// values surface as validation errors rather than decode failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskData {
    #[serde(rename = "type")]
    pub task_type: String,
    pub input: i64,
    pub operation: String,
}

impl TaskData {
    /// A calculation request for `operation` on `input`.
    pub fn calculation(operation: Operation, input: i64) -> Self {
        Self {
            task_type: CALCULATION_TASK_TYPE.to_string(),
            input,
            operation: operation.as_str().to_string(),
        }
    }

    /// Parse the requested operation.
    pub fn parsed_operation(&self) -> Result<Operation, ValidationError> {
        self.operation
            .parse::<Operation>()
            .map_err(|_| ValidationError::UnsupportedOperation(self.operation.clone()))
    }
}

/// A unit of work and its lifecycle record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub priority: TaskPriority,
    pub created_at: DateTime<Utc>,
    pub data: TaskData,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, rename = "error", skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Create a pending task.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        priority: TaskPriority,
        data: TaskData,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            priority,
            created_at: Utc::now(),
            data,
            status: TaskStatus::Pending,
            result: None,
            error_message: None,
            completed_at: None,
        }
    }

    /// Returns true if an explicit completion request would succeed.
    pub fn is_completable(&self) -> bool {
        self.status == TaskStatus::Processing && self.result.is_some()
    }

    /// PENDING -> PROCESSING.
    pub fn mark_processing(&mut self) -> Result<(), TaskError> {
        self.expect_status(TaskStatus::Pending, "start processing")?;
        self.status = TaskStatus::Processing;
        Ok(())
    }

    /// Record the calculation result. Status stays PROCESSING.
    pub fn set_result(&mut self, value: impl Into<String>) -> Result<(), TaskError> {
        self.expect_status(TaskStatus::Processing, "record result for")?;
        self.result = Some(value.into());
        Ok(())
    }

    /// Record a calculation error. Status is unchanged until `mark_failed`.
    pub fn set_error(&mut self, message: impl Into<String>) -> Result<(), TaskError> {
        self.expect_status(TaskStatus::Processing, "record error for")?;
        self.error_message = Some(message.into());
        Ok(())
    }

    /// PROCESSING (with a result) -> COMPLETED.
    pub fn mark_completed(&mut self) -> Result<(), TaskError> {
        if !self.is_completable() {
            return Err(self.invalid_transition("complete"));
        }
        self.status = TaskStatus::Completed;
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    /// PROCESSING (without a result) -> FAILED.
    pub fn mark_failed(&mut self) -> Result<(), TaskError> {
        if self.status != TaskStatus::Processing || self.result.is_some() {
            return Err(self.invalid_transition("fail"));
        }
        self.status = TaskStatus::Failed;
        Ok(())
    }

    fn expect_status(&self, expected: TaskStatus, operation: &'static str) -> Result<(), TaskError> {
        if self.status != expected {
            return Err(self.invalid_transition(operation));
        }
        Ok(())
    }

    fn invalid_transition(&self, operation: &'static str) -> TaskError {
        TaskError::InvalidTransition {
            task_id: self.id.clone(),
            current: self.status,
            operation,
        }
    }
}
