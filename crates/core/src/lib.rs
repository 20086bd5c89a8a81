pub mod calc;
pub mod config;
pub mod metrics;
pub mod orchestrator;
pub mod task;
pub mod worker;

pub use calc::{CalculationError, Operation};
pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config,
    ConfigError, ServerConfig,
};
pub use orchestrator::{
    OrchestratorConfig, OrchestratorError, OrchestratorStatus, SystemStats, TaskOrchestrator,
};
pub use task::{Task, TaskData, TaskError, TaskPriority, TaskStatus, ValidationError};
pub use worker::{CompletionOutcome, Worker, WorkerError, WorkerStats};
