//! Response normalization.
//!
//! Maps each transport's success and failure shape onto the uniform
//! [`ResponseEnvelope`]. HTTP backends answer with their own envelope, which is
//! decoded and checked: a nested `error: true` always becomes a failure. The
//! other transports carry no structured reply, so a synthetic success message
//! is built for them.

use broker_core::{BackendEnvelope, DispatchError, ResponseEnvelope};
use http::StatusCode;

use crate::transport::{HttpReply, RawReply, TransportError};

/// Message used when the RPC backend answers with an empty result string.
const RPC_FALLBACK_MESSAGE: &str = "logged via RPC";

/// Which action a reply belongs to. Decides the success message and how
/// HTTP statuses are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyContext<'a> {
    Auth,
    Log,
    Mail { to: &'a str },
}

impl From<TransportError> for DispatchError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Unavailable { kind, reason } => Self::TransportUnavailable {
                transport: kind,
                reason,
            },
            TransportError::Rejected { message, .. } => Self::BackendError {
                message,
                status: None,
            },
        }
    }
}

/// Normalizes one transport outcome into the uniform envelope.
///
/// # Errors
///
/// - `TransportUnavailable` when the transport could not complete the call
/// - `InvalidCredentials` when the auth backend answers `401`
/// - `BackendError` for any other non-`202` HTTP status, an undecodable auth
///   reply, a nested error envelope, or a rejected call
pub fn normalize(
    context: ReplyContext<'_>,
    outcome: Result<RawReply, TransportError>,
) -> Result<ResponseEnvelope, DispatchError> {
    match (context, outcome?) {
        (ReplyContext::Auth, RawReply::Http(reply)) => normalize_auth(&reply),
        (ReplyContext::Mail { to }, RawReply::Http(reply)) => {
            accepted_envelope(&reply, "mail")?;
            Ok(ResponseEnvelope::success(format!("Message sent to {to}"), None))
        }
        (ReplyContext::Log, RawReply::Http(reply)) => {
            accepted_envelope(&reply, "log")?;
            Ok(ResponseEnvelope::success("logged", None))
        }
        (ReplyContext::Log, RawReply::Rpc(result)) => {
            let message = if result.is_empty() {
                RPC_FALLBACK_MESSAGE.to_string()
            } else {
                result
            };
            Ok(ResponseEnvelope::success(message, None))
        }
        (ReplyContext::Log, RawReply::Grpc(_)) => {
            Ok(ResponseEnvelope::success("logged via gRPC", None))
        }
        (ReplyContext::Log, RawReply::Published) => {
            Ok(ResponseEnvelope::success("logged via RabbitMQ", None))
        }
        (context, reply) => Err(DispatchError::backend(format!(
            "unexpected {} reply for {context:?}",
            reply_label(&reply)
        ))),
    }
}

fn normalize_auth(reply: &HttpReply) -> Result<ResponseEnvelope, DispatchError> {
    if reply.status == StatusCode::UNAUTHORIZED {
        return Err(DispatchError::InvalidCredentials);
    }

    let envelope = accepted_envelope(reply, "auth")?.ok_or_else(|| DispatchError::BackendError {
        message: "empty response from auth service".to_string(),
        status: Some(reply.status.as_u16()),
    })?;

    Ok(ResponseEnvelope::success("Authenticated!", envelope.data))
}

/// Checks the status is `202 Accepted` and decodes the backend's envelope, if
/// the body has one. A decoded envelope reporting an error is a failure.
fn accepted_envelope(
    reply: &HttpReply,
    service: &str,
) -> Result<Option<BackendEnvelope>, DispatchError> {
    if reply.status != StatusCode::ACCEPTED {
        return Err(DispatchError::BackendError {
            message: format!("error calling {service} service"),
            status: Some(reply.status.as_u16()),
        });
    }

    if reply.body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    let envelope: BackendEnvelope =
        serde_json::from_slice(&reply.body).map_err(|e| DispatchError::BackendError {
            message: format!("malformed response from {service} service: {e}"),
            status: Some(reply.status.as_u16()),
        })?;

    if envelope.error {
        let message = if envelope.message.is_empty() {
            format!("{service} service reported an error")
        } else {
            envelope.message
        };
        return Err(DispatchError::BackendError {
            message,
            status: Some(reply.status.as_u16()),
        });
    }

    Ok(Some(envelope))
}

fn reply_label(reply: &RawReply) -> &'static str {
    match reply {
        RawReply::Http(_) => "http",
        RawReply::Rpc(_) => "rpc",
        RawReply::Grpc(_) => "grpc",
        RawReply::Published => "queue",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use broker_core::TransportKind;
    use bytes::Bytes;
    use serde_json::json;

    use super::*;

    fn http(status: StatusCode, body: serde_json::Value) -> Result<RawReply, TransportError> {
        Ok(RawReply::Http(HttpReply {
            status,
            body: Bytes::from(serde_json::to_vec(&body).unwrap()),
        }))
    }

    fn http_empty(status: StatusCode) -> Result<RawReply, TransportError> {
        Ok(RawReply::Http(HttpReply {
            status,
            body: Bytes::new(),
        }))
    }

    #[test]
    fn auth_success_passes_data_through() {
        let user = json!({"id": 1, "email": "u@x.com", "active": 1});
        let env = normalize(
            ReplyContext::Auth,
            http(
                StatusCode::ACCEPTED,
                json!({"error": false, "message": "Logged in user u@x.com", "data": user}),
            ),
        )
        .unwrap();

        assert!(!env.is_error());
        assert_eq!(env.message(), "Authenticated!");
        assert_eq!(env.data(), Some(&user));
    }

    #[test]
    fn auth_401_is_invalid_credentials() {
        let err = normalize(ReplyContext::Auth, http_empty(StatusCode::UNAUTHORIZED)).unwrap_err();
        assert_eq!(err, DispatchError::InvalidCredentials);
        assert!(ResponseEnvelope::from(&err)
            .message()
            .contains("invalid credentials"));
    }

    #[test]
    fn auth_other_status_is_backend_error_with_status() {
        let err = normalize(
            ReplyContext::Auth,
            http(
                StatusCode::BAD_REQUEST,
                json!({"error": true, "message": "invalid credentials"}),
            ),
        )
        .unwrap_err();
        assert_eq!(
            err,
            DispatchError::BackendError {
                message: "error calling auth service".to_string(),
                status: Some(400),
            }
        );
    }

    #[test]
    fn nested_error_envelope_is_not_swallowed() {
        let err = normalize(
            ReplyContext::Auth,
            http(
                StatusCode::ACCEPTED,
                json!({"error": true, "message": "account locked"}),
            ),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            DispatchError::BackendError { ref message, .. } if message == "account locked"
        ));
    }

    #[test]
    fn auth_empty_body_is_backend_error() {
        let err = normalize(ReplyContext::Auth, http_empty(StatusCode::ACCEPTED)).unwrap_err();
        assert!(matches!(err, DispatchError::BackendError { .. }));
    }

    #[test]
    fn auth_malformed_body_is_backend_error() {
        let outcome = Ok(RawReply::Http(HttpReply {
            status: StatusCode::ACCEPTED,
            body: Bytes::from_static(b"<html>oops</html>"),
        }));
        let err = normalize(ReplyContext::Auth, outcome).unwrap_err();
        assert!(matches!(
            err,
            DispatchError::BackendError { ref message, .. } if message.starts_with("malformed response")
        ));
    }

    #[test]
    fn mail_success_names_recipient() {
        let env = normalize(
            ReplyContext::Mail { to: "a@b.com" },
            http(StatusCode::ACCEPTED, json!({"error": false, "message": "sent to a@b.com"})),
        )
        .unwrap();
        assert_eq!(env.message(), "Message sent to a@b.com");
        assert!(env.data().is_none());
    }

    #[test]
    fn mail_without_body_still_succeeds() {
        let env = normalize(
            ReplyContext::Mail { to: "a@b.com" },
            http_empty(StatusCode::ACCEPTED),
        )
        .unwrap();
        assert_eq!(env.message(), "Message sent to a@b.com");
    }

    #[test]
    fn mail_non_accepted_is_backend_error() {
        let err = normalize(
            ReplyContext::Mail { to: "a@b.com" },
            http_empty(StatusCode::INTERNAL_SERVER_ERROR),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            DispatchError::BackendError { status: Some(500), .. }
        ));
    }

    #[test]
    fn mail_nested_error_is_backend_error() {
        let err = normalize(
            ReplyContext::Mail { to: "a@b.com" },
            http(
                StatusCode::ACCEPTED,
                json!({"error": true, "message": "mailbox full"}),
            ),
        )
        .unwrap_err();
        assert_eq!(
            err,
            DispatchError::BackendError {
                message: "mailbox full".to_string(),
                status: Some(202),
            }
        );
    }

    #[test]
    fn log_nested_error_without_message_names_service() {
        let err = normalize(
            ReplyContext::Log,
            http(StatusCode::ACCEPTED, json!({"error": true})),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            DispatchError::BackendError { ref message, status: Some(202) }
                if message == "log service reported an error"
        ));
    }

    #[test]
    fn log_replies_per_transport() {
        let over_http = normalize(
            ReplyContext::Log,
            http(StatusCode::ACCEPTED, json!({"error": false, "message": "logged"})),
        )
        .unwrap();
        assert_eq!(over_http.message(), "logged");

        let over_rpc = normalize(
            ReplyContext::Log,
            Ok(RawReply::Rpc("Process payload via RPC:n".to_string())),
        )
        .unwrap();
        assert_eq!(over_rpc.message(), "Process payload via RPC:n");

        let over_grpc =
            normalize(ReplyContext::Log, Ok(RawReply::Grpc("logged".to_string()))).unwrap();
        assert_eq!(over_grpc.message(), "logged via gRPC");

        let over_queue = normalize(ReplyContext::Log, Ok(RawReply::Published)).unwrap();
        assert_eq!(over_queue.message(), "logged via RabbitMQ");
    }

    #[test]
    fn empty_rpc_result_uses_fallback() {
        let env = normalize(ReplyContext::Log, Ok(RawReply::Rpc(String::new()))).unwrap();
        assert_eq!(env.message(), RPC_FALLBACK_MESSAGE);
    }

    #[test]
    fn unavailable_transport_maps_to_transport_unavailable() {
        for kind in [
            TransportKind::Http,
            TransportKind::Rpc,
            TransportKind::Grpc,
            TransportKind::Queue,
        ] {
            let err = normalize(
                ReplyContext::Log,
                Err(TransportError::unavailable(kind, "connection refused")),
            )
            .unwrap_err();
            assert!(matches!(
                err,
                DispatchError::TransportUnavailable { transport, .. } if transport == kind
            ));
        }
    }

    #[test]
    fn rejected_call_maps_to_backend_error() {
        let err = normalize(
            ReplyContext::Log,
            Err(TransportError::rejected(TransportKind::Grpc, "failed")),
        )
        .unwrap_err();
        assert_eq!(err, DispatchError::backend("failed"));
    }

    #[test]
    fn mismatched_reply_is_backend_error() {
        let err = normalize(ReplyContext::Auth, Ok(RawReply::Published)).unwrap_err();
        assert!(matches!(err, DispatchError::BackendError { .. }));
    }
}
