//! Transport clients, one per backend wire protocol.
//!
//! - [`http`]: JSON over HTTP `POST` (auth, mail, and optionally log)
//! - [`rpc`]: length-delimited `MsgPack` remote call over TCP (log)
//! - [`grpc`]: unary gRPC with a fixed deadline (log)
//! - [`queue`]: fire-and-forget topic publish over AMQP (log)
//!
//! Clients are stateless per call: every call opens its own connection and
//! releases it before returning, on success and on every error path. Nothing
//! here retries.

pub mod grpc;
pub mod http;
pub mod queue;
pub mod rpc;

pub use grpc::{GrpcLogTransport, GRPC_DEADLINE};
pub use http::{AuthClient, HttpLogTransport, HttpReply, HttpTransport, MailClient};
pub use queue::{AmqpPublisher, QueueLogTransport, TopicPublisher, DEFAULT_EXCHANGE, LOG_TOPIC};
pub use rpc::RpcLogTransport;

use std::fmt::Display;

use broker_core::TransportKind;

/// Raw, not yet normalized, result of one transport call.
#[derive(Debug, Clone, PartialEq)]
pub enum RawReply {
    /// Status and fully-read body of an HTTP backend reply.
    Http(HttpReply),
    /// Plain result string returned by the remote procedure.
    Rpc(String),
    /// `result` field of the gRPC acknowledgement.
    Grpc(String),
    /// The message was handed to the queue broker.
    Published,
}

/// Failure of a single transport call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The backend could not be reached or the call did not complete.
    #[error("{kind} transport unavailable: {reason}")]
    Unavailable { kind: TransportKind, reason: String },

    /// The backend was reached and refused the call.
    #[error("{kind} backend rejected the call: {message}")]
    Rejected { kind: TransportKind, message: String },
}

impl TransportError {
    /// Wraps any displayable cause as [`TransportError::Unavailable`].
    pub fn unavailable(kind: TransportKind, cause: impl Display) -> Self {
        Self::Unavailable {
            kind,
            reason: cause.to_string(),
        }
    }

    /// Wraps any displayable cause as [`TransportError::Rejected`].
    pub fn rejected(kind: TransportKind, cause: impl Display) -> Self {
        Self::Rejected {
            kind,
            message: cause.to_string(),
        }
    }

    /// Transport the failure happened on.
    #[must_use]
    pub fn kind(&self) -> TransportKind {
        match self {
            Self::Unavailable { kind, .. } | Self::Rejected { kind, .. } => *kind,
        }
    }
}
