//! Pipeline composition: wraps the `Dispatcher` in the middleware stack.

use broker_core::{ActionRequest, DispatchError, ResponseEnvelope, TransportKind};
use tower::{ServiceBuilder, ServiceExt};

use super::load_shed::LoadShedLayer;
use super::metrics::MetricsLayer;
use crate::dispatch::config::DispatchConfig;
use crate::dispatch::dispatcher::Dispatcher;

/// The dispatcher behind its middleware layers, shareable across handlers.
///
/// Layer order (outermost to innermost):
/// 1. `LoadShedLayer` -- reject when overloaded before any transport work
/// 2. `MetricsLayer` -- record timing and outcome around the dispatch
///
/// Clones share the same concurrency permits.
#[derive(Clone)]
pub struct DispatchPipeline {
    dispatcher: Dispatcher,
    load_shed: LoadShedLayer,
}

impl DispatchPipeline {
    #[must_use]
    pub fn new(dispatcher: Dispatcher, config: &DispatchConfig) -> Self {
        Self {
            dispatcher,
            load_shed: LoadShedLayer::new(config.max_concurrent_dispatches),
        }
    }

    #[must_use]
    pub fn log_transport(&self) -> TransportKind {
        self.dispatcher.log_transport()
    }

    /// Free load-shedding permits.
    #[must_use]
    pub fn available_permits(&self) -> usize {
        self.load_shed.available()
    }

    /// Runs one request through the full stack.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::Overloaded` when the concurrency limit is hit,
    /// otherwise whatever the dispatcher returns.
    pub async fn call(&self, req: ActionRequest) -> Result<ResponseEnvelope, DispatchError> {
        ServiceBuilder::new()
            .layer(self.load_shed.clone())
            .layer(MetricsLayer)
            .service(self.dispatcher.clone())
            .oneshot(req)
            .await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
