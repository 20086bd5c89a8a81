use std::sync::Arc;
use taskproc_core::{Config, TaskOrchestrator};

/// Shared application state
pub struct AppState {
    config: Config,
    orchestrator: Arc<TaskOrchestrator>,
}

impl AppState {
    pub fn new(config: Config, orchestrator: Arc<TaskOrchestrator>) -> Self {
        Self {
            config,
            orchestrator,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn orchestrator(&self) -> &TaskOrchestrator {
        self.orchestrator.as_ref()
    }
}
