//! HTTP handler definitions for the broker ingress.
//!
//! This module defines `AppState` (the shared state carried through axum
//! extractors) and re-exports all handler functions for building the router.

pub mod health;
pub mod submission;

pub use health::{health_handler, liveness_handler, readiness_handler};
pub use submission::{broker_handler, status_for, submission_handler};

use std::sync::Arc;
use std::time::Instant;

use super::Lifecycle;
use crate::dispatch::DispatchPipeline;

/// Shared application state passed to all axum handlers via `State` extraction.
///
/// Cloning is cheap: every field is a handle.
#[derive(Clone)]
pub struct AppState {
    /// Dispatcher behind its load-shed and metrics layers.
    pub pipeline: DispatchPipeline,
    /// Serving phase and in-flight dispatch count.
    pub lifecycle: Arc<Lifecycle>,
    /// Process start time, used for uptime calculation.
    pub start_time: Instant,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::dispatch::dispatcher::tests::Fakes;
    use crate::dispatch::DispatchConfig;

    pub(crate) fn test_state(fakes: &Fakes) -> AppState {
        let pipeline = DispatchPipeline::new(fakes.dispatcher(), &DispatchConfig::default());
        AppState {
            lifecycle: Arc::new(Lifecycle::new(pipeline.log_transport())),
            pipeline,
            start_time: Instant::now(),
        }
    }
}
