use tracing::warn;

use super::{types::Config, ConfigError};

pub const MIN_PORT: u16 = 1025;

/// Total processing threads above which startup logs a warning.
pub const THREAD_WARNING_THRESHOLD: usize = 200;

/// Validate configuration
/// Currently validates:
/// - Orchestrator sizing (see `OrchestratorConfig::validate`)
/// - Server port is unprivileged
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port < MIN_PORT {
        return Err(ConfigError::ValidationError(format!(
            "server.port must be between {} and 65535, got {}",
            MIN_PORT, config.server.port
        )));
    }

    config
        .orchestrator
        .validate()
        .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

    let total = config.orchestrator.total_threads();
    if total > THREAD_WARNING_THRESHOLD {
        warn!(
            "Configuration spawns {} processing threads ({} workers x {} threads)",
            total, config.orchestrator.num_workers, config.orchestrator.threads_per_worker
        );
    }

    Ok(())
}
