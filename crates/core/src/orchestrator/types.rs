//! Types for the task orchestrator.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::task::ValidationError;
use crate::worker::{WorkerError, WorkerStats};

/// Errors that can occur during orchestration.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The task payload was rejected. No task id was issued.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The orchestrator is stopped and not accepting tasks.
    #[error("orchestrator is not running")]
    NotRunning,

    #[error("invalid orchestrator config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Worker(#[from] WorkerError),
}

/// Aggregate statistics across all workers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemStats {
    pub total_tasks_processed: u64,
    pub total_tasks_completed: u64,
    pub total_tasks_failed: u64,
    pub total_workers: usize,
    /// Seconds since the orchestrator was constructed.
    pub uptime_seconds: u64,
    pub per_worker: Vec<WorkerStats>,
}

/// Current status of the orchestrator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorStatus {
    /// Whether the orchestrator is accepting tasks.
    pub running: bool,
    pub total_workers: usize,
    /// Processing threads across all workers.
    pub total_threads: usize,
    /// Tasks queued and not yet dequeued, across all workers.
    pub queued_tasks: usize,
    /// Task records held, across all workers.
    pub stored_tasks: usize,
}
