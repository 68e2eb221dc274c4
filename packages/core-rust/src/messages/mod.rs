//! Wire-compatible message schemas for the broker.
//!
//! - [`request`]: the inbound tagged action envelope and its payloads (JSON)
//! - [`envelope`]: the uniform `{error, message, data}` reply shape (JSON)
//! - [`rpc`]: request/reply frames of the binary-RPC log path (`MsgPack`)

pub mod envelope;
pub mod request;
pub mod rpc;

pub use envelope::{BackendEnvelope, ResponseEnvelope};
pub use request::{ActionRequest, ActionTag, AuthPayload, LogPayload, MailPayload};
pub use rpc::{RpcPayload, RpcReply, RpcRequest, LOG_INFO_METHOD};
