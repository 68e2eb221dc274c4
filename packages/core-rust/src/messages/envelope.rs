//! The uniform reply envelope.
//!
//! Every dispatch result, successful or not and whatever transport produced
//! it, leaves the broker as `{"error": bool, "message": string, "data": any|null}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DispatchError;

/// Normalized reply produced exactly once per dispatch.
///
/// Fields are private so an envelope cannot change after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    error: bool,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

impl ResponseEnvelope {
    /// A successful reply, optionally carrying backend data.
    pub fn success(message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            error: false,
            message: message.into(),
            data,
        }
    }

    /// A failed reply. Failures never carry data.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            error: true,
            message: message.into(),
            data: None,
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }
}

impl From<&DispatchError> for ResponseEnvelope {
    fn from(err: &DispatchError) -> Self {
        Self::failure(err.to_string())
    }
}

/// Envelope decoded from an HTTP backend's reply body.
///
/// Backends omit `message` and `data` freely, so both default.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BackendEnvelope {
    #[serde(default)]
    pub error: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}
