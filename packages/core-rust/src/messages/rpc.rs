//! Frames for the binary-RPC log path.
//!
//! One request frame and one reply frame per connection. Frames are
//! `MsgPack`-encoded with named fields (`rmp_serde::to_vec_named()`) and
//! carried in length-delimited chunks. The field spelling of [`RpcPayload`]
//! follows the remote log server's exported argument type.

use serde::{Deserialize, Serialize};

use super::request::LogPayload;

/// Remote method that appends one log entry.
pub const LOG_INFO_METHOD: &str = "RPCServer.LogInfo";

/// Argument of `RPCServer.LogInfo`.
///
/// Structurally identical to [`LogPayload`] but kept separate so the RPC wire
/// shape can diverge from the public request shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RpcPayload {
    pub name: String,
    pub data: String,
}

impl From<&LogPayload> for RpcPayload {
    fn from(log: &LogPayload) -> Self {
        Self {
            name: log.name.clone(),
            data: log.data.clone(),
        }
    }
}

/// A single remote call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcRequest {
    pub seq: u64,
    pub service_method: String,
    pub params: RpcPayload,
}

/// The single reply to an [`RpcRequest`]. Exactly one of `result` and `error`
/// is set by a well-behaved server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcReply {
    pub seq: u64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}
