//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the task processing server:
//! - HTTP request metrics (latency, counts, in flight)
//! - Core task metrics (registered from `taskproc_core::metrics`)
//! - Orchestrator and worker status (collected dynamically)

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, Opts,
    Registry, TextEncoder,
};
use regex_lite::Regex;
use tracing::warn;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "taskproc_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("taskproc_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "taskproc_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Orchestrator Metrics (collected dynamically)
// =============================================================================

/// Whether the orchestrator is accepting tasks (1 = running).
pub static ORCHESTRATOR_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "taskproc_orchestrator_running",
        "Whether the orchestrator is running",
    )
    .unwrap()
});

/// Configured number of workers.
pub static WORKERS_TOTAL: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("taskproc_workers_total", "Number of workers").unwrap()
});

/// Tasks waiting in each worker's queue.
pub static WORKER_QUEUE_DEPTH: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new(
            "taskproc_worker_queue_depth",
            "Tasks queued and not yet picked up, per worker",
        ),
        &["worker"],
    )
    .unwrap()
});

/// Task records held across all workers.
pub static TASKS_STORED: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "taskproc_tasks_stored",
        "Task records held across all workers",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    let server_metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(HTTP_REQUEST_DURATION.clone()),
        Box::new(HTTP_REQUESTS_TOTAL.clone()),
        Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()),
        Box::new(ORCHESTRATOR_RUNNING.clone()),
        Box::new(WORKERS_TOTAL.clone()),
        Box::new(WORKER_QUEUE_DEPTH.clone()),
        Box::new(TASKS_STORED.clone()),
    ];

    for metric in server_metrics
        .into_iter()
        .chain(taskproc_core::metrics::all_metrics())
    {
        if let Err(e) = registry.register(metric) {
            warn!("Failed to register metric: {}", e);
        }
    }
}

// =============================================================================
// Helper functions
// =============================================================================

/// Encode all metrics in Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!("Failed to encode metrics: {}", e);
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Refresh gauges that mirror live orchestrator state.
pub fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let orchestrator = state.orchestrator();
    let status = orchestrator.status();

    ORCHESTRATOR_RUNNING.set(if status.running { 1 } else { 0 });
    WORKERS_TOTAL.set(status.total_workers as i64);
    TASKS_STORED.set(status.stored_tasks as i64);

    for worker in orchestrator.system_stats().per_worker {
        WORKER_QUEUE_DEPTH
            .with_label_values(&[&worker.worker_id.to_string()])
            .set(worker.queue_depth as i64);
    }
}

static UUID_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}")
        .unwrap()
});

static TASK_ID_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^/task/[^/]+").unwrap());

static NUMERIC_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"/\d+(/|$)").unwrap());

/// Collapse caller-chosen ids so path labels stay low-cardinality.
pub fn normalize_path(path: &str) -> String {
    if path == "/task/create" {
        return path.to_string();
    }

    let result = UUID_REGEX.replace_all(path, "{id}");
    let result = TASK_ID_REGEX.replace(&result, "/task/{id}");
    let result = NUMERIC_REGEX.replace_all(&result, "/{id}$1");
    result.to_string()
}
