//! Worker thread pool implementation.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::calc::{self, CalculationError, Operation};
use crate::metrics::{CALCULATION_DURATION, TASKS_COMPLETED_TOTAL, TASKS_PROCESSED_TOTAL};
use crate::task::{Task, TaskData};

use super::types::{CompletionOutcome, WorkerCounters, WorkerError, WorkerStats};

/// Take a lock, recovering the guard if a processing thread panicked while holding it.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct QueueState {
    pending: VecDeque<Task>,
    shutdown: bool,
}

/// State shared between the worker handle and its processing threads.
struct WorkerShared {
    id: usize,
    queue: Mutex<QueueState>,
    available: Condvar,
    tasks: Mutex<HashMap<String, Task>>,
    counters: WorkerCounters,
    running: AtomicBool,
    started_at: Instant,
}

impl WorkerShared {
    /// Block until a task is queued or shutdown is requested.
    ///
    /// Returns `None` on shutdown; tasks still queued are left where they are.
    fn next_task(&self) -> Option<Task> {
        let mut queue = lock(&self.queue);
        loop {
            if queue.shutdown {
                return None;
            }
            if let Some(task) = queue.pending.pop_front() {
                return Some(task);
            }
            queue = self
                .available
                .wait(queue)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn run(&self, index: usize) {
        debug!("Processing thread {} started for worker {}", index, self.id);
        while let Some(task) = self.next_task() {
            self.process_task(task);
        }
        debug!("Processing thread {} stopped for worker {}", index, self.id);
    }

    fn store(&self, task: Task) {
        lock(&self.tasks).insert(task.id.clone(), task);
    }

    fn process_task(&self, mut task: Task) {
        if let Err(e) = task.mark_processing() {
            warn!("Worker {} skipping task {}: {}", self.id, task.id, e);
            return;
        }
        // Make "processing, no result yet" visible to lookups.
        self.store(task.clone());

        let started = Instant::now();
        let outcome = compute(&task.data);
        CALCULATION_DURATION
            .with_label_values(&[operation_label(&task.data)])
            .observe(started.elapsed().as_secs_f64());

        let succeeded = outcome.is_ok();
        let recorded = match outcome {
            Ok(value) => {
                debug!(
                    "Worker {} computed {}({}) for task {}",
                    self.id, task.data.operation, task.data.input, task.id
                );
                task.set_result(value)
            }
            Err(e) => {
                warn!("Task {} failed on worker {}: {}", task.id, self.id, e);
                task.set_error(e.to_string()).and_then(|()| task.mark_failed())
            }
        };
        if let Err(e) = recorded {
            error!("Worker {} could not record outcome: {}", self.id, e);
        }

        // Counted before the outcome is visible, so a caller that sees the
        // result also sees it in the stats.
        self.counters.processed.fetch_add(1, Ordering::Relaxed);
        if succeeded {
            TASKS_PROCESSED_TOTAL.with_label_values(&["success"]).inc();
        } else {
            self.counters.failed.fetch_add(1, Ordering::Relaxed);
            TASKS_PROCESSED_TOTAL.with_label_values(&["failed"]).inc();
        }
        self.store(task);
    }
}

fn compute(data: &TaskData) -> Result<String, CalculationError> {
    let operation = data.operation.parse::<Operation>()?;
    calc::execute(operation, data.input)
}

fn operation_label(data: &TaskData) -> &'static str {
    data.operation
        .parse::<Operation>()
        .map(|op| op.as_str())
        .unwrap_or("unknown")
}

/// An independent execution domain: FIFO queue, processing threads and task records.
pub struct Worker {
    num_threads: usize,
    shared: Arc<WorkerShared>,
    threads: Mutex<Vec<JoinHandle<()>>>,
}

impl Worker {
    /// Create a stopped worker with `num_threads` processing threads.
    pub fn new(id: usize, num_threads: usize) -> Self {
        Self {
            num_threads,
            shared: Arc::new(WorkerShared {
                id,
                queue: Mutex::new(QueueState {
                    pending: VecDeque::new(),
                    shutdown: false,
                }),
                available: Condvar::new(),
                tasks: Mutex::new(HashMap::new()),
                counters: WorkerCounters::default(),
                running: AtomicBool::new(false),
                started_at: Instant::now(),
            }),
            threads: Mutex::new(Vec::new()),
        }
    }

    pub fn id(&self) -> usize {
        self.shared.id
    }

    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Spawn the processing threads. No-op if already running.
    ///
    /// The thread list lock is held for the whole transition, so `running`
    /// always agrees with the set of live threads.
    pub fn start(&self) -> Result<(), WorkerError> {
        let mut threads = lock(&self.threads);
        if self.is_running() {
            debug!("Worker {} already running", self.id());
            return Ok(());
        }

        lock(&self.shared.queue).shutdown = false;

        for index in 0..self.num_threads {
            let shared = Arc::clone(&self.shared);
            let spawned = thread::Builder::new()
                .name(format!("worker-{}-{}", self.id(), index))
                .spawn(move || shared.run(index));
            match spawned {
                Ok(handle) => threads.push(handle),
                Err(source) => {
                    let err = WorkerError::Spawn {
                        worker_id: self.id(),
                        thread: index,
                        source,
                    };
                    error!("{}", err);
                    self.shutdown_threads(&mut threads);
                    return Err(err);
                }
            }
        }

        self.shared.running.store(true, Ordering::Release);
        info!(
            "Worker {} started with {} processing threads",
            self.id(),
            self.num_threads
        );
        Ok(())
    }

    /// Stop the worker and join every processing thread.
    ///
    /// A task already dequeued runs to completion before its thread exits.
    /// Tasks still queued stay PENDING. No-op if not running.
    pub fn stop(&self) {
        let mut threads = lock(&self.threads);
        if !self.is_running() {
            return;
        }
        self.shared.running.store(false, Ordering::Release);
        self.shutdown_threads(&mut threads);

        let abandoned = lock(&self.shared.queue).pending.len();
        if abandoned > 0 {
            warn!(
                "Worker {} stopped with {} queued tasks left pending",
                self.id(),
                abandoned
            );
        }
        info!("Worker {} stopped", self.id());
    }

    /// Signal shutdown and join `threads`. Caller holds the thread list lock.
    fn shutdown_threads(&self, threads: &mut Vec<JoinHandle<()>>) {
        lock(&self.shared.queue).shutdown = true;
        self.shared.available.notify_all();

        for handle in threads.drain(..) {
            if handle.join().is_err() {
                error!("A processing thread of worker {} panicked", self.id());
            }
        }
    }

    /// Register the task and append it to the tail of the queue.
    ///
    /// An existing record with the same id is overwritten.
    pub fn add_task(&self, task: Task) {
        debug!("Worker {} received task {}", self.id(), task.id);
        // The record must exist before any processing thread can dequeue the task.
        self.shared.store(task.clone());
        lock(&self.shared.queue).pending.push_back(task);
        self.shared.available.notify_one();
    }

    /// Snapshot of the stored task.
    pub fn get_task(&self, task_id: &str) -> Option<Task> {
        lock(&self.shared.tasks).get(task_id).cloned()
    }

    /// Move a PROCESSING task that has a result to COMPLETED.
    pub fn complete_task(&self, task_id: &str) -> CompletionOutcome {
        let mut tasks = lock(&self.shared.tasks);
        let Some(task) = tasks.get_mut(task_id) else {
            return CompletionOutcome::NotFound;
        };

        match task.mark_completed() {
            Ok(()) => {
                self.shared.counters.completed.fetch_add(1, Ordering::Relaxed);
                TASKS_COMPLETED_TOTAL.inc();
                info!("Task {} completed on worker {}", task_id, self.id());
                CompletionOutcome::Completed(task.clone())
            }
            Err(e) => {
                debug!("Worker {}: {}", self.id(), e);
                CompletionOutcome::NotCompletable(task.status)
            }
        }
    }

    /// Number of task records held by this worker.
    pub fn task_count(&self) -> usize {
        lock(&self.shared.tasks).len()
    }

    pub fn queue_depth(&self) -> usize {
        lock(&self.shared.queue).pending.len()
    }

    pub fn stats(&self) -> WorkerStats {
        let counters = &self.shared.counters;
        WorkerStats {
            worker_id: self.id(),
            tasks_processed: counters.processed(),
            tasks_completed: counters.completed(),
            tasks_failed: counters.failed(),
            queue_depth: self.queue_depth(),
            uptime_seconds: self.shared.started_at.elapsed().as_secs(),
            running: self.is_running(),
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{TaskPriority, TaskStatus, CALCULATION_TASK_TYPE};
    use std::time::Duration;

    fn calc_task(id: &str, operation: Operation, input: i64) -> Task {
        Task::new(
            id,
            format!("{} {}", operation, input),
            TaskPriority::Medium,
            TaskData::calculation(operation, input),
        )
    }

    fn wait_for(worker: &Worker, id: &str, condition: impl Fn(&Task) -> bool) -> Task {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(task) = worker.get_task(id) {
                if condition(&task) {
                    return task;
                }
            }
            assert!(Instant::now() < deadline, "task {} never reached the expected state", id);
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_worker_creation() {
        let worker = Worker::new(3, 2);
        assert_eq!(worker.id(), 3);
        assert_eq!(worker.num_threads(), 2);
        assert!(!worker.is_running());

        let stats = worker.stats();
        assert_eq!(stats.worker_id, 3);
        assert_eq!(stats.tasks_processed, 0);
        assert!(!stats.running);
    }

    #[test]
    fn test_add_task_registers_pending_copy() {
        let worker = Worker::new(0, 2);
        worker.add_task(calc_task("t1", Operation::Factorial, 5));

        let task = worker.get_task("t1").unwrap();
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(worker.queue_depth(), 1);
        assert!(worker.get_task("missing").is_none());
    }

    #[test]
    fn test_processing_leaves_task_in_processing() {
        let worker = Worker::new(0, 2);
        worker.start().unwrap();
        worker.add_task(calc_task("t1", Operation::Factorial, 5));

        let task = wait_for(&worker, "t1", |t| t.result.is_some());
        assert_eq!(task.result.as_deref(), Some("120"));
        assert_eq!(task.status, TaskStatus::Processing);
        worker.stop();
    }

    #[test]
    fn test_complete_task_once() {
        let worker = Worker::new(0, 1);
        worker.start().unwrap();
        worker.add_task(calc_task("t1", Operation::Fibonacci, 10));

        wait_for(&worker, "t1", Task::is_completable);

        match worker.complete_task("t1") {
            CompletionOutcome::Completed(task) => {
                assert_eq!(task.status, TaskStatus::Completed);
                assert_eq!(task.result.as_deref(), Some("55"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(
            worker.complete_task("t1"),
            CompletionOutcome::NotCompletable(TaskStatus::Completed)
        );
        assert_eq!(worker.stats().tasks_completed, 1);
        worker.stop();
    }

    #[test]
    fn test_complete_pending_task_fails() {
        let worker = Worker::new(0, 1);
        worker.add_task(calc_task("t1", Operation::PrimeCheck, 17));

        assert_eq!(
            worker.complete_task("t1"),
            CompletionOutcome::NotCompletable(TaskStatus::Pending)
        );
        assert_eq!(worker.complete_task("nope"), CompletionOutcome::NotFound);
        assert_eq!(worker.stats().tasks_completed, 0);
    }

    #[test]
    fn test_computation_error_marks_failed() {
        let worker = Worker::new(0, 1);
        worker.start().unwrap();
        // Bypasses orchestrator validation on purpose.
        let task = Task::new(
            "bad",
            "bad prime",
            TaskPriority::Low,
            TaskData {
                task_type: CALCULATION_TASK_TYPE.to_string(),
                input: 1,
                operation: "prime_check".to_string(),
            },
        );
        worker.add_task(task);

        let task = wait_for(&worker, "bad", |t| t.status == TaskStatus::Failed);
        assert!(task.result.is_none());
        assert!(task.error_message.unwrap().contains("prime_check"));

        let stats = worker.stats();
        assert_eq!(stats.tasks_processed, 1);
        assert_eq!(stats.tasks_failed, 1);
        assert_eq!(
            worker.complete_task("bad"),
            CompletionOutcome::NotCompletable(TaskStatus::Failed)
        );
        worker.stop();
    }

    #[test]
    fn test_queue_is_fifo_regardless_of_priority() {
        let worker = Worker::new(0, 1);
        for (id, priority) in [
            ("a", TaskPriority::Low),
            ("b", TaskPriority::High),
            ("c", TaskPriority::Medium),
        ] {
            let mut task = calc_task(id, Operation::Factorial, 3);
            task.priority = priority;
            worker.add_task(task);
        }

        let order: Vec<String> = (0..3)
            .filter_map(|_| worker.shared.next_task())
            .map(|t| t.id)
            .collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_duplicate_id_overwrites_record() {
        let worker = Worker::new(0, 1);
        worker.add_task(calc_task("dup", Operation::Factorial, 3));
        worker.add_task(calc_task("dup", Operation::Fibonacci, 7));

        assert_eq!(worker.task_count(), 1);
        assert_eq!(worker.get_task("dup").unwrap().data.operation, "fibonacci");
        assert_eq!(worker.queue_depth(), 2);
    }

    #[test]
    fn test_start_and_stop_are_idempotent() {
        let worker = Worker::new(0, 3);
        worker.start().unwrap();
        worker.start().unwrap();
        assert!(worker.is_running());
        assert_eq!(lock(&worker.threads).len(), 3);

        worker.stop();
        worker.stop();
        assert!(!worker.is_running());
        assert!(lock(&worker.threads).is_empty());
    }

    #[test]
    fn test_queued_tasks_stay_pending_when_never_started() {
        let worker = Worker::new(0, 2);
        worker.add_task(calc_task("t1", Operation::Factorial, 4));
        worker.stop();
        assert_eq!(worker.get_task("t1").unwrap().status, TaskStatus::Pending);
    }

    #[test]
    fn test_restart_processes_backlog() {
        let worker = Worker::new(0, 2);
        worker.start().unwrap();
        worker.stop();

        worker.add_task(calc_task("late", Operation::Factorial, 6));
        worker.start().unwrap();
        let task = wait_for(&worker, "late", |t| t.result.is_some());
        assert_eq!(task.id, "late");
        worker.stop();
    }

    #[test]
    fn test_stop_leaves_no_task_mid_computation() {
        let worker = Worker::new(0, 1);
        worker.start().unwrap();

        let ids: Vec<String> = (0..20).map(|i| format!("fib-{}", i)).collect();
        for id in &ids {
            worker.add_task(calc_task(id, Operation::Fibonacci, 1000));
        }

        // Stop as soon as the single thread has picked something up.
        let deadline = Instant::now() + Duration::from_secs(5);
        while ids
            .iter()
            .all(|id| worker.get_task(id).unwrap().status == TaskStatus::Pending)
        {
            assert!(Instant::now() < deadline, "no task was ever dequeued");
            thread::yield_now();
        }
        worker.stop();

        for id in &ids {
            let task = worker.get_task(id).unwrap();
            match task.status {
                TaskStatus::Pending => assert!(task.result.is_none()),
                TaskStatus::Processing => assert!(
                    task.result.is_some(),
                    "task {} left processing without a result",
                    id
                ),
                TaskStatus::Failed => assert!(task.error_message.is_some()),
                TaskStatus::Completed => panic!("task {} completed without a request", id),
            }
        }
        assert!(worker.stats().tasks_processed >= 1);
    }

    #[test]
    fn test_concurrent_start_stop_keeps_state_consistent() {
        let worker = Arc::new(Worker::new(0, 2));

        let togglers: Vec<_> = (0..4)
            .map(|n| {
                let worker = Arc::clone(&worker);
                thread::spawn(move || {
                    for i in 0..50 {
                        if (i + n) % 2 == 0 {
                            worker.start().unwrap();
                        } else {
                            worker.stop();
                        }
                    }
                })
            })
            .collect();
        for handle in togglers {
            handle.join().unwrap();
        }

        let live = lock(&worker.threads).len();
        if worker.is_running() {
            assert_eq!(live, 2);
        } else {
            assert_eq!(live, 0);
        }

        // A running worker must still process.
        worker.start().unwrap();
        worker.add_task(calc_task("after", Operation::Factorial, 5));
        let task = wait_for(&worker, "after", |t| t.result.is_some());
        assert_eq!(task.result.as_deref(), Some("120"));

        worker.stop();
        assert!(!worker.is_running());
        assert!(lock(&worker.threads).is_empty());
    }
}
