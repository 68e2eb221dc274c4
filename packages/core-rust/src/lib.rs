//! Broker core: action envelopes, the uniform response envelope, the dispatch
//! error taxonomy, and binary-RPC frame types.
//!
//! This crate performs no I/O. The server crate owns every transport.

pub mod error;
pub mod messages;
pub mod types;

pub use error::DispatchError;
pub use messages::{
    ActionRequest, ActionTag, AuthPayload, BackendEnvelope, LogPayload, MailPayload,
    ResponseEnvelope, RpcPayload, RpcReply, RpcRequest,
};
pub use types::TransportKind;
