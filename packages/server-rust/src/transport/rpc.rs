//! Binary-RPC log transport.
//!
//! Each call dials the log server, writes one length-delimited `MsgPack`
//! [`RpcRequest`] frame, reads one [`RpcReply`] frame, and drops the
//! connection. There is no pooling and no structured error payload: the reply
//! carries either a plain result string or an error string.

use std::fmt::Display;

use async_trait::async_trait;
use broker_core::messages::LOG_INFO_METHOD;
use broker_core::{LogPayload, RpcPayload, RpcReply, RpcRequest, TransportKind};
use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_util::codec::{Framed, LengthDelimitedCodec};
use tracing::{debug, warn};

use super::{RawReply, TransportError};
use crate::traits::LogTransport;

fn rpc_unavailable(cause: impl Display) -> TransportError {
    TransportError::unavailable(TransportKind::Rpc, cause)
}

/// Log route over binary RPC (`RPCServer.LogInfo`).
#[derive(Debug, Clone)]
pub struct RpcLogTransport {
    address: String,
}

impl RpcLogTransport {
    /// `address` is a `host:port` pair, e.g. `logger-service:5001`.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }

    /// Performs one synchronous remote call and returns its result string.
    ///
    /// # Errors
    ///
    /// Every failure, whether dial, I/O, a malformed reply, or an error
    /// returned by the remote method, is `TransportError::Unavailable`.
    pub async fn call(&self, params: RpcPayload) -> Result<String, TransportError> {
        debug!(address = %self.address, method = LOG_INFO_METHOD, "dialing RPC backend");

        let stream = TcpStream::connect(&self.address)
            .await
            .map_err(rpc_unavailable)?;
        let mut framed = Framed::new(stream, LengthDelimitedCodec::new());

        let request = RpcRequest {
            seq: 0,
            service_method: LOG_INFO_METHOD.to_string(),
            params,
        };
        let frame = rmp_serde::to_vec_named(&request).map_err(rpc_unavailable)?;
        framed
            .send(Bytes::from(frame))
            .await
            .map_err(rpc_unavailable)?;

        let frame = match framed.next().await {
            Some(frame) => frame.map_err(rpc_unavailable)?,
            None => return Err(rpc_unavailable("connection closed before reply")),
        };
        // Dropping `framed` here closes the socket before the reply is interpreted.
        drop(framed);

        let reply: RpcReply = rmp_serde::from_slice(&frame).map_err(rpc_unavailable)?;
        if reply.seq != request.seq {
            return Err(rpc_unavailable(format!(
                "reply sequence {} does not match request {}",
                reply.seq, request.seq
            )));
        }
        if let Some(remote) = reply.error {
            warn!(address = %self.address, error = %remote, "RPC backend returned an error");
            return Err(rpc_unavailable(format!("remote error: {remote}")));
        }

        Ok(reply.result.unwrap_or_default())
    }
}

#[async_trait]
impl LogTransport for RpcLogTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Rpc
    }

    async fn write(&self, entry: &LogPayload) -> Result<RawReply, TransportError> {
        self.call(RpcPayload::from(entry)).await.map(RawReply::Rpc)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
