//! Shared scalar types used across the broker crates.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The wire protocol a transport client speaks to reach its backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Synchronous JSON over HTTP `POST`.
    Http,
    /// Length-delimited MessagePack remote procedure call over TCP.
    Rpc,
    /// Unary gRPC call over an insecure HTTP/2 channel.
    Grpc,
    /// Fire-and-forget publish to a topic exchange.
    Queue,
}

impl TransportKind {
    /// Returns the lowercase name used in logs and error messages.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Rpc => "rpc",
            Self::Grpc => "grpc",
            Self::Queue => "queue",
        }
    }

    /// Whether the caller blocks until the backend has processed the request.
    ///
    /// Only the queue transport returns after local hand-off to the broker.
    #[must_use]
    pub fn is_synchronous(self) -> bool {
        !matches!(self, Self::Queue)
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
