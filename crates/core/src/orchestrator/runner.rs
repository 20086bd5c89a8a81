//! Orchestrator implementation.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::metrics::{TASKS_CREATED_TOTAL, TASKS_REJECTED_TOTAL};
use crate::task::Task;
use crate::worker::{CompletionOutcome, Worker};

use super::config::OrchestratorConfig;
use super::types::{OrchestratorError, OrchestratorStatus, SystemStats};

/// Routes tasks across a fixed set of workers.
pub struct TaskOrchestrator {
    config: OrchestratorConfig,
    workers: Vec<Worker>,
    next_worker: AtomicUsize,
    running: AtomicBool,
    started_at: Instant,
}

impl TaskOrchestrator {
    /// Build a stopped orchestrator with `config.num_workers` workers.
    pub fn new(config: OrchestratorConfig) -> Result<Self, OrchestratorError> {
        config.validate()?;

        let workers = (0..config.num_workers)
            .map(|id| Worker::new(id, config.threads_per_worker))
            .collect();

        info!(
            "Created orchestrator with {} workers x {} threads",
            config.num_workers, config.threads_per_worker
        );

        Ok(Self {
            config,
            workers,
            next_worker: AtomicUsize::new(0),
            running: AtomicBool::new(false),
            started_at: Instant::now(),
        })
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    pub fn worker(&self, index: usize) -> Option<&Worker> {
        self.workers.get(index)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Start every worker, then begin accepting tasks. No-op if already running.
    ///
    /// If any worker fails to start, the workers already started are stopped again.
    pub fn start(&self) -> Result<(), OrchestratorError> {
        if self.running.load(Ordering::Acquire) {
            warn!("Orchestrator already running");
            return Ok(());
        }

        info!("Starting task orchestrator");

        for worker in &self.workers {
            if let Err(e) = worker.start() {
                for started in &self.workers {
                    started.stop();
                }
                return Err(e.into());
            }
        }

        if self.running.swap(true, Ordering::AcqRel) {
            debug!("Orchestrator started concurrently");
        }
        info!("Task orchestrator started");
        Ok(())
    }

    /// Stop accepting tasks, then stop every worker and join its threads.
    /// No-op if not running.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::AcqRel) {
            warn!("Orchestrator not running");
            return;
        }

        info!("Stopping task orchestrator");
        for worker in &self.workers {
            worker.stop();
        }
        info!("Task orchestrator stopped");
    }

    /// Validate the task and hand it to the next worker in round-robin order.
    ///
    /// Returns the task id.
    pub fn create_task(&self, task: Task) -> Result<String, OrchestratorError> {
        if !self.is_running() {
            TASKS_REJECTED_TOTAL.with_label_values(&["not_running"]).inc();
            return Err(OrchestratorError::NotRunning);
        }

        if let Err(e) = task.validate() {
            warn!("Rejected task '{}': {}", task.id, e);
            TASKS_REJECTED_TOTAL.with_label_values(&["validation"]).inc();
            return Err(e.into());
        }

        let index = self.select_worker();
        let task_id = task.id.clone();
        debug!("Routing task {} to worker {}", task_id, index);
        self.workers[index].add_task(task);
        TASKS_CREATED_TOTAL.inc();

        Ok(task_id)
    }

    /// Snapshot from the first worker, in index order, that holds the id.
    pub fn get_task(&self, task_id: &str) -> Option<Task> {
        self.workers
            .iter()
            .find_map(|worker| worker.get_task(task_id))
    }

    /// Complete the task on the first worker that can.
    ///
    /// `NotCompletable` carries the status from the first worker holding the id
    /// when none of them could complete it.
    pub fn complete_task(&self, task_id: &str) -> CompletionOutcome {
        let mut not_completable = None;

        for worker in &self.workers {
            match worker.complete_task(task_id) {
                CompletionOutcome::Completed(task) => return CompletionOutcome::Completed(task),
                CompletionOutcome::NotCompletable(status) => {
                    not_completable.get_or_insert(status);
                }
                CompletionOutcome::NotFound => {}
            }
        }

        match not_completable {
            Some(status) => CompletionOutcome::NotCompletable(status),
            None => CompletionOutcome::NotFound,
        }
    }

    /// Fresh sum over every worker's live counters.
    pub fn system_stats(&self) -> SystemStats {
        let per_worker: Vec<_> = self.workers.iter().map(Worker::stats).collect();

        SystemStats {
            total_tasks_processed: per_worker.iter().map(|s| s.tasks_processed).sum(),
            total_tasks_completed: per_worker.iter().map(|s| s.tasks_completed).sum(),
            total_tasks_failed: per_worker.iter().map(|s| s.tasks_failed).sum(),
            total_workers: self.workers.len(),
            uptime_seconds: self.started_at.elapsed().as_secs(),
            per_worker,
        }
    }

    pub fn status(&self) -> OrchestratorStatus {
        OrchestratorStatus {
            running: self.is_running(),
            total_workers: self.workers.len(),
            total_threads: self.workers.iter().map(Worker::num_threads).sum(),
            queued_tasks: self.workers.iter().map(Worker::queue_depth).sum(),
            stored_tasks: self.workers.iter().map(Worker::task_count).sum(),
        }
    }

    fn select_worker(&self) -> usize {
        self.next_worker.fetch_add(1, Ordering::Relaxed) % self.workers.len()
    }
}

impl Drop for TaskOrchestrator {
    fn drop(&mut self) {
        if self.is_running() {
            self.stop();
        }
    }
}
