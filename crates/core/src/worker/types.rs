//! Types shared by the worker and its callers.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::task::{Task, TaskStatus};

/// Errors raised while managing a worker's thread pool.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("failed to spawn processing thread {thread} for worker {worker_id}: {source}")]
    Spawn {
        worker_id: usize,
        thread: usize,
        #[source]
        source: std::io::Error,
    },
}

/// Result of a completion request against one worker.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionOutcome {
    /// The task moved to COMPLETED. Carries a snapshot taken after the transition.
    Completed(Task),
    /// The task exists but is not in a completable state.
    NotCompletable(TaskStatus),
    /// This worker does not own the id.
    NotFound,
}

impl CompletionOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, CompletionOutcome::Completed(_))
    }
}

/// Point-in-time statistics for a single worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerStats {
    pub worker_id: usize,
    pub tasks_processed: u64,
    pub tasks_completed: u64,
    pub tasks_failed: u64,
    /// Tasks queued and not yet picked up by a processing thread.
    pub queue_depth: usize,
    pub uptime_seconds: u64,
    pub running: bool,
}

/// Lock-free counters updated by processing threads and completion calls.
#[derive(Debug, Default)]
pub(super) struct WorkerCounters {
    pub processed: AtomicU64,
    pub completed: AtomicU64,
    pub failed: AtomicU64,
}

impl WorkerCounters {
    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }
}
