//! System statistics handler.

use axum::{extract::State, Json};
use std::sync::Arc;
use taskproc_core::SystemStats;

use crate::state::AppState;

/// Aggregate counters summed over every worker, plus per-worker detail.
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<SystemStats> {
    Json(state.orchestrator().system_stats())
}
