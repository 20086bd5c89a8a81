use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taskproc_core::{
    load_config, load_config_from_env, validate_config, ConfigError, TaskOrchestrator,
};
use taskproc_server::{api::create_router, state::AppState};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("TASKPROC_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration, falling back to defaults when no file exists
    info!("Loading configuration from {:?}", config_path);
    let config = match load_config(&config_path) {
        Ok(config) => config,
        Err(ConfigError::FileNotFound(path)) => {
            warn!("Config file {} not found, using defaults", path);
            load_config_from_env().context("Failed to load config from environment")?
        }
        Err(e) => {
            return Err(e)
                .with_context(|| format!("Failed to load config from {:?}", config_path))
        }
    };

    validate_config(&config).context("Configuration validation failed")?;

    info!(
        "Configuration loaded: {} workers x {} threads",
        config.orchestrator.num_workers, config.orchestrator.threads_per_worker
    );

    // Create and start orchestrator
    let orchestrator = Arc::new(
        TaskOrchestrator::new(config.orchestrator.clone())
            .context("Failed to create orchestrator")?,
    );
    orchestrator
        .start()
        .context("Failed to start orchestrator")?;

    let state = Arc::new(AppState::new(config.clone(), Arc::clone(&orchestrator)));
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            stop_orchestrator(orchestrator).await;
            return Err(e).with_context(|| format!("Failed to bind to {}", addr));
        }
    };

    // Run server with graceful shutdown
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error");

    info!("Server shutting down...");
    stop_orchestrator(orchestrator).await;

    served
}

/// Stop the orchestrator off the async runtime; it joins every processing thread.
async fn stop_orchestrator(orchestrator: Arc<TaskOrchestrator>) {
    info!("Stopping orchestrator...");
    match tokio::task::spawn_blocking(move || orchestrator.stop()).await {
        Ok(()) => info!("Orchestrator stopped"),
        Err(e) => error!("Orchestrator shutdown task failed: {}", e),
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
