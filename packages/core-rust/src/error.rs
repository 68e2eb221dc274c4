//! Dispatch error taxonomy.
//!
//! Every failure a dispatch can end in is one of these variants. None of them
//! is retried; each is surfaced to the original caller inside a failure
//! [`ResponseEnvelope`](crate::ResponseEnvelope).

use crate::types::TransportKind;

/// Errors returned by the action dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// The action tag is not one of the known tags. No transport call was made.
    #[error("unknown action: {action}")]
    UnknownAction { action: String },

    /// The inbound envelope was malformed or its payload failed validation.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The authentication backend rejected the supplied credentials.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The backend could not be reached (dial, connect, timeout, I/O).
    #[error("{transport} transport unavailable: {reason}")]
    TransportUnavailable {
        transport: TransportKind,
        reason: String,
    },

    /// The backend was reached but answered with an unexpected status or an
    /// error envelope.
    #[error("{message}")]
    BackendError {
        message: String,
        /// Raw upstream HTTP status, when the backend speaks HTTP.
        status: Option<u16>,
    },

    /// All dispatch permits are in use.
    #[error("broker overloaded, try again later")]
    Overloaded,
}

impl DispatchError {
    /// Shorthand for a [`DispatchError::BackendError`] without an upstream status.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::BackendError {
            message: message.into(),
            status: None,
        }
    }

    /// Stable machine-readable name of the error class.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownAction { .. } => "unknown_action",
            Self::BadRequest(_) => "bad_request",
            Self::InvalidCredentials => "invalid_credentials",
            Self::TransportUnavailable { .. } => "transport_unavailable",
            Self::BackendError { .. } => "backend_error",
            Self::Overloaded => "overloaded",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_credentials_message() {
        assert_eq!(
            DispatchError::InvalidCredentials.to_string(),
            "invalid credentials"
        );
    }

    #[test]
    fn transport_unavailable_names_transport() {
        let err = DispatchError::TransportUnavailable {
            transport: TransportKind::Grpc,
            reason: "deadline exceeded".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "grpc transport unavailable: deadline exceeded"
        );
        assert_eq!(err.kind(), "transport_unavailable");
    }

    #[test]
    fn backend_error_displays_backend_message() {
        let err = DispatchError::BackendError {
            message: "error calling auth service".to_string(),
            status: Some(500),
        };
        assert_eq!(err.to_string(), "error calling auth service");
    }

    #[test]
    fn unknown_action_carries_tag() {
        let err = DispatchError::UnknownAction {
            action: "bogus".to_string(),
        };
        assert_eq!(err.to_string(), "unknown action: bogus");
    }
}
