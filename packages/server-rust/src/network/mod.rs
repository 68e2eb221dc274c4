//! Ingress networking: configuration, HTTP layers, handlers, and lifecycle.

pub mod config;
pub mod handlers;
pub mod lifecycle;
pub mod middleware;
pub mod module;

pub use config::*;
pub use handlers::AppState;
pub use lifecycle::{DispatchTicket, Lifecycle, Phase};
pub use module::NetworkModule;
