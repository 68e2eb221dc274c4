use async_trait::async_trait;
use broker_core::{AuthPayload, LogPayload, MailPayload, TransportKind};

use crate::transport::{HttpReply, RawReply, TransportError};

/// Reaches the authentication backend.
/// Implementations: HTTP (`AuthClient`), counting fakes (tests).
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Forward the credentials and return the backend's raw reply.
    async fn authenticate(&self, payload: &AuthPayload) -> Result<HttpReply, TransportError>;
}

/// Reaches the mail backend.
/// Implementations: HTTP (`MailClient`), counting fakes (tests).
#[async_trait]
pub trait MailBackend: Send + Sync {
    /// Hand the message to the mail backend and return its raw reply.
    async fn send(&self, payload: &MailPayload) -> Result<HttpReply, TransportError>;
}

/// The single capability the `log` action is routed to.
/// Implementations: HTTP, binary RPC, gRPC, queue publish. Exactly one is
/// wired per deployment, chosen at configuration time.
#[async_trait]
pub trait LogTransport: Send + Sync {
    /// Wire protocol this implementation speaks.
    fn kind(&self) -> TransportKind;

    /// Append one entry to the logging backend.
    async fn write(&self, entry: &LogPayload) -> Result<RawReply, TransportError>;
}
