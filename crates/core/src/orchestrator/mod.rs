//! Task orchestrator: owns the workers, routes new tasks and aggregates stats.
//!
//! - **Routing**: round-robin over workers via one atomic counter, independent
//!   of priority or load.
//! - **Lookup / completion**: linear fan-out in worker index order. There is no
//!   cross-worker index, so a resubmitted id may live on several workers.
//! - **Stats**: always a fresh sum of every worker's live snapshot.

mod config;
mod runner;
mod types;

pub use config::OrchestratorConfig;
pub use runner::TaskOrchestrator;
pub use types::{OrchestratorError, OrchestratorStatus, SystemStats};
