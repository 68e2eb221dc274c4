//! Tower middleware layers for the dispatch pipeline.
//!
//! - [`metrics`]: dispatch timing and outcome via `tracing` spans
//! - [`load_shed`]: semaphore-based concurrency limiting
//! - [`pipeline`]: composes the layers around the dispatcher

pub mod load_shed;
pub mod metrics;
pub mod pipeline;

pub use load_shed::LoadShedLayer;
pub use metrics::MetricsLayer;
pub use pipeline::DispatchPipeline;
