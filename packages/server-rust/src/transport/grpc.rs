//! gRPC log transport.
//!
//! Speaks the log service's unary `WriteLog` method over an insecure channel.
//! The message types and the client call are written against `prost` and
//! `tonic::client::Grpc` directly, which is what generated client code
//! expands to.

use std::time::Duration;

use async_trait::async_trait;
use broker_core::{LogPayload, TransportKind};
use http::uri::PathAndQuery;
use tonic::codec::ProstCodec;
use tonic::transport::{Channel, Endpoint};
use tonic::Code;
use tracing::{debug, warn};

use super::{RawReply, TransportError};
use crate::traits::LogTransport;

/// Deadline for connecting and completing one `WriteLog` call.
pub const GRPC_DEADLINE: Duration = Duration::from_secs(1);

const WRITE_LOG_PATH: &str = "/logs.LogService/WriteLog";

// ---------------------------------------------------------------------------
// Wire messages (package `logs`)
// ---------------------------------------------------------------------------

/// A log entry as carried on the gRPC wire.
#[derive(Clone, PartialEq, prost::Message)]
pub struct LogEntry {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub data: String,
}

impl From<&LogPayload> for LogEntry {
    fn from(log: &LogPayload) -> Self {
        Self {
            name: log.name.clone(),
            data: log.data.clone(),
        }
    }
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct LogRequest {
    #[prost(message, optional, tag = "1")]
    pub log_entry: Option<LogEntry>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct LogResponse {
    #[prost(string, tag = "1")]
    pub result: String,
}

// ---------------------------------------------------------------------------
// GrpcLogTransport
// ---------------------------------------------------------------------------

/// Log route over gRPC.
#[derive(Debug, Clone)]
pub struct GrpcLogTransport {
    address: String,
    deadline: Duration,
}

impl GrpcLogTransport {
    /// `address` is a URI such as `http://logger-service:50001`.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            deadline: GRPC_DEADLINE,
        }
    }

    /// Connects, issues one unary `WriteLog`, and returns the ack's `result`.
    ///
    /// Connect and call together are bounded by the deadline. The channel is
    /// owned by this call and dropped before it returns on every path,
    /// including when the deadline fires.
    ///
    /// # Errors
    ///
    /// - `TransportError::Unavailable` on an invalid address, connect failure,
    ///   deadline expiry, or a `DeadlineExceeded`/`Unavailable`/`Cancelled` status.
    /// - `TransportError::Rejected` for any other non-OK status.
    pub async fn call(&self, entry: LogEntry) -> Result<String, TransportError> {
        debug!(address = %self.address, "calling gRPC log backend");

        let endpoint = Endpoint::from_shared(self.address.clone())
            .map_err(|e| TransportError::unavailable(TransportKind::Grpc, e))?
            .connect_timeout(self.deadline);

        match tokio::time::timeout(self.deadline, write_log(endpoint, entry)).await {
            Ok(result) => result,
            Err(_elapsed) => {
                warn!(address = %self.address, "gRPC log call exceeded deadline");
                Err(TransportError::unavailable(
                    TransportKind::Grpc,
                    format!("deadline of {}ms exceeded", self.deadline.as_millis()),
                ))
            }
        }
    }
}

async fn write_log(endpoint: Endpoint, entry: LogEntry) -> Result<String, TransportError> {
    let channel: Channel = endpoint
        .connect()
        .await
        .map_err(|e| TransportError::unavailable(TransportKind::Grpc, e))?;

    let mut grpc = tonic::client::Grpc::new(channel);
    grpc.ready()
        .await
        .map_err(|e| TransportError::unavailable(TransportKind::Grpc, e))?;

    let codec: ProstCodec<LogRequest, LogResponse> = ProstCodec::default();
    let request = tonic::Request::new(LogRequest {
        log_entry: Some(entry),
    });

    let response = grpc
        .unary(request, PathAndQuery::from_static(WRITE_LOG_PATH), codec)
        .await
        .map_err(status_to_error)?;

    Ok(response.into_inner().result)
}

fn status_to_error(status: tonic::Status) -> TransportError {
    match status.code() {
        Code::DeadlineExceeded | Code::Unavailable | Code::Cancelled => {
            TransportError::unavailable(TransportKind::Grpc, status.message())
        }
        _ => TransportError::rejected(TransportKind::Grpc, status.message()),
    }
}

#[async_trait]
impl LogTransport for GrpcLogTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Grpc
    }

    async fn write(&self, entry: &LogPayload) -> Result<RawReply, TransportError> {
        self.call(LogEntry::from(entry)).await.map(RawReply::Grpc)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use prost::Message;
    use tokio::net::TcpListener;

    use super::*;

    fn entry() -> LogPayload {
        LogPayload {
            name: "n".to_string(),
            data: "d".to_string(),
        }
    }

    #[test]
    fn log_request_encodes_nested_entry() {
        let request = LogRequest {
            log_entry: Some(LogEntry::from(&entry())),
        };
        let bytes = request.encode_to_vec();
        let decoded = LogRequest::decode(bytes.as_slice()).unwrap();
        assert_eq!(decoded.log_entry.unwrap().name, "n");
    }

    #[test]
    fn status_mapping() {
        assert!(matches!(
            status_to_error(tonic::Status::deadline_exceeded("slow")),
            TransportError::Unavailable { .. }
        ));
        assert!(matches!(
            status_to_error(tonic::Status::unavailable("down")),
            TransportError::Unavailable { .. }
        ));
        assert!(matches!(
            status_to_error(tonic::Status::internal("failed")),
            TransportError::Rejected { ref message, .. } if message == "failed"
        ));
    }

    #[tokio::test]
    async fn connect_failure_is_unavailable() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = GrpcLogTransport::new(format!("http://{addr}"));
        assert_eq!(transport.kind(), TransportKind::Grpc);

        let err = transport.write(&entry()).await.unwrap_err();
        assert!(matches!(
            err,
            TransportError::Unavailable {
                kind: TransportKind::Grpc,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn stalled_backend_hits_deadline() {
        // Accepts TCP connections but never speaks HTTP/2.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let started = Instant::now();
        let err = GrpcLogTransport::new(format!("http://{addr}"))
            .write(&entry())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            TransportError::Unavailable {
                kind: TransportKind::Grpc,
                ..
            }
        ));
        assert!(started.elapsed() < GRPC_DEADLINE * 3);
        server.abort();
    }

    #[tokio::test]
    async fn invalid_address_is_unavailable() {
        let err = GrpcLogTransport::new("not a uri")
            .write(&entry())
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Unavailable { .. }));
    }
}
