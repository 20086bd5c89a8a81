//! Orchestrator configuration.

use serde::{Deserialize, Serialize};

use super::types::OrchestratorError;

pub const MAX_WORKERS: usize = 50;
pub const MAX_THREADS_PER_WORKER: usize = 32;

/// Sizing of the worker pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Number of independent workers (1-50).
    #[serde(default = "default_num_workers")]
    pub num_workers: usize,

    /// Processing threads per worker (1-32).
    #[serde(default = "default_threads_per_worker")]
    pub threads_per_worker: usize,
}

fn default_num_workers() -> usize {
    3
}

fn default_threads_per_worker() -> usize {
    4
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            num_workers: default_num_workers(),
            threads_per_worker: default_threads_per_worker(),
        }
    }
}

impl OrchestratorConfig {
    pub fn validate(&self) -> Result<(), OrchestratorError> {
        if !(1..=MAX_WORKERS).contains(&self.num_workers) {
            return Err(OrchestratorError::InvalidConfig(format!(
                "num_workers must be between 1 and {}, got {}",
                MAX_WORKERS, self.num_workers
            )));
        }
        if !(1..=MAX_THREADS_PER_WORKER).contains(&self.threads_per_worker) {
            return Err(OrchestratorError::InvalidConfig(format!(
                "threads_per_worker must be between 1 and {}, got {}",
                MAX_THREADS_PER_WORKER, self.threads_per_worker
            )));
        }
        Ok(())
    }

    pub fn total_threads(&self) -> usize {
        self.num_workers * self.threads_per_worker
    }
}
