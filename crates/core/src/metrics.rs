//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Orchestrator (task creation and rejection)
//! - Workers (processing results, completions, calculation latency)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Orchestrator Metrics
// =============================================================================

/// Tasks accepted and routed to a worker.
pub static TASKS_CREATED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "taskproc_tasks_created_total",
        "Total tasks accepted and assigned to a worker",
    )
    .unwrap()
});

/// Tasks rejected at creation by reason.
pub static TASKS_REJECTED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "taskproc_tasks_rejected_total",
            "Total task creation requests rejected",
        ),
        &["reason"], // "validation", "not_running"
    )
    .unwrap()
});

// =============================================================================
// Worker Metrics
// =============================================================================

/// Tasks run by a processing thread, by result.
pub static TASKS_PROCESSED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "taskproc_tasks_processed_total",
            "Total tasks processed by worker threads",
        ),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

/// Tasks moved to completed by an explicit request.
pub static TASKS_COMPLETED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "taskproc_tasks_completed_total",
        "Total tasks marked completed",
    )
    .unwrap()
});

/// Time spent inside a calculation.
pub static CALCULATION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "taskproc_calculation_duration_seconds",
            "Duration of a single calculation",
        )
        .buckets(vec![
            0.000_01, 0.000_05, 0.000_1, 0.000_5, 0.001, 0.005, 0.01, 0.05, 0.1,
        ]),
        &["operation"],
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(TASKS_CREATED_TOTAL.clone()),
        Box::new(TASKS_REJECTED_TOTAL.clone()),
        Box::new(TASKS_PROCESSED_TOTAL.clone()),
        Box::new(TASKS_COMPLETED_TOTAL.clone()),
        Box::new(CALCULATION_DURATION.clone()),
    ]
}
