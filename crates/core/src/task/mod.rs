//! Task entity and its status state machine.
//!
//! A task moves strictly forward:
//!
//! ```text
//! pending -> processing -> completed
//!                      \-> failed
//! ```
//!
//! `processing` spans the calculation itself and, once a result is recorded,
//! the wait for an explicit completion request. A calculation error moves the
//! task straight to `failed`.

mod types;
mod validate;

pub use types::{Task, TaskData, TaskError, TaskPriority, TaskStatus, CALCULATION_TASK_TYPE};
pub use validate::ValidationError;
