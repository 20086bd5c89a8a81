//! HTTP adapter for the task processing core.

pub mod api;
pub mod metrics;
pub mod state;
