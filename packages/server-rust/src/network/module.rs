//! Network module with deferred startup lifecycle.
//!
//! `new()` creates resources, `start()` binds the TCP listener, and `serve()`
//! starts accepting connections. Binding before serving lets the caller learn
//! the actual port (useful with port 0) before traffic flows.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, warn};

use super::config::{NetworkConfig, MAX_BODY_BYTES};
use super::handlers::{
    broker_handler, health_handler, liveness_handler, readiness_handler, submission_handler,
    AppState,
};
use super::middleware::build_http_layers;
use super::lifecycle::Lifecycle;
use crate::dispatch::DispatchPipeline;

/// How long `serve()` waits for in-flight dispatches after the shutdown signal.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Manages the ingress server lifecycle.
///
/// 1. `new()` -- allocates shared state (broker lifecycle)
/// 2. `start()` -- binds TCP listener to the configured address
/// 3. `serve()` -- accepts submissions until shutdown is signalled
pub struct NetworkModule {
    config: NetworkConfig,
    pipeline: DispatchPipeline,
    listener: Option<TcpListener>,
    lifecycle: Arc<Lifecycle>,
}

impl NetworkModule {
    /// Creates a new network module without binding any port.
    #[must_use]
    pub fn new(config: NetworkConfig, pipeline: DispatchPipeline) -> Self {
        let lifecycle = Arc::new(Lifecycle::new(pipeline.log_transport()));
        Self {
            config,
            pipeline,
            listener: None,
            lifecycle,
        }
    }

    /// Returns a shared handle to the broker lifecycle.
    #[must_use]
    pub fn lifecycle(&self) -> Arc<Lifecycle> {
        Arc::clone(&self.lifecycle)
    }

    /// Assembles the axum router with all routes and middleware.
    ///
    /// Routes:
    /// - `POST /` -- fixed acknowledgement
    /// - `POST /handle` -- action submission
    /// - `GET /health` -- phase, route and capacity envelope
    /// - `GET /health/live` -- process liveness
    /// - `GET /health/ready` -- accepting submissions
    pub fn build_router(&self) -> Router {
        let state = AppState {
            pipeline: self.pipeline.clone(),
            lifecycle: Arc::clone(&self.lifecycle),
            start_time: Instant::now(),
        };

        let layers = build_http_layers(&self.config);

        Router::new()
            .route("/", post(broker_handler))
            .route("/handle", post(submission_handler))
            .route("/health", get(health_handler))
            .route("/health/live", get(liveness_handler))
            .route("/health/ready", get(readiness_handler))
            .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
            .layer(layers)
            .with_state(state)
    }

    /// Binds the TCP listener to the configured host and port.
    ///
    /// Returns the actual bound port, which differs from the configured one
    /// when port 0 is used.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound (e.g., port in use).
    pub async fn start(&mut self) -> anyhow::Result<u16> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        let port = listener.local_addr()?.port();

        info!("TCP listener bound to {}:{}", self.config.host, port);

        self.listener = Some(listener);
        Ok(port)
    }

    /// Serves submissions until the shutdown future resolves, then drains.
    ///
    /// After the shutdown signal the broker moves to Draining and waits up to
    /// 30 seconds for in-flight dispatches before moving to Stopped.
    ///
    /// # Errors
    ///
    /// Returns an error if the server encounters a fatal I/O error.
    ///
    /// # Panics
    ///
    /// Panics if `start()` was not called before `serve()`.
    pub async fn serve(
        mut self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let listener = self
            .listener
            .take()
            .expect("start() must be called before serve()");
        let router = self.build_router();
        let lifecycle = self.lifecycle;

        lifecycle.begin_serving();
        info!(log_transport = %lifecycle.log_transport(), "Serving broker ingress");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await?;

        let in_flight = lifecycle.in_flight();
        if in_flight > 0 {
            info!(in_flight, "Draining in-flight dispatches");
        }
        if lifecycle.drain(DRAIN_TIMEOUT).await {
            info!("All dispatches drained");
        } else {
            warn!(
                in_flight = lifecycle.in_flight(),
                "Drain timeout expired with dispatches outstanding"
            );
        }
        Ok(())
    }
}
