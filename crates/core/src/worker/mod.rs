//! Worker: a FIFO queue drained by a fixed pool of OS threads.
//!
//! Each worker owns two independent locks, one for the queue and one for the
//! id -> task map. They are always taken one at a time, never nested.
//! Statistics are plain atomics and can be read without either lock.

mod pool;
mod types;

pub use pool::Worker;
pub use types::{CompletionOutcome, WorkerError, WorkerStats};
