//! Action dispatch: routing, response normalization, and the middleware
//! pipeline in front of it.

pub mod config;
pub mod dispatcher;
pub mod middleware;
pub mod normalize;

pub use config::{DispatchConfig, LogRoute};
pub use dispatcher::{Backends, Dispatcher};
pub use middleware::DispatchPipeline;
pub use normalize::{normalize, ReplyContext};
