//! Broker server: accepts action submissions over HTTP and forwards each one
//! to the authentication, mail, or logging backend over that backend's wire
//! protocol (HTTP, binary RPC, gRPC, or an AMQP topic).

pub mod dispatch;
pub mod network;
pub mod traits;
pub mod transport;

pub use dispatch::{Backends, DispatchConfig, DispatchPipeline, Dispatcher, LogRoute};
pub use network::{NetworkConfig, NetworkModule};
pub use traits::{AuthBackend, LogTransport, MailBackend};
pub use transport::{RawReply, TransportError};
