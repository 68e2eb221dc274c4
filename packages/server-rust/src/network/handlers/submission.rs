//! Action submission handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use broker_core::{ActionRequest, DispatchError, ResponseEnvelope};
use bytes::Bytes;
use tracing::debug;

use super::AppState;

/// `POST /`: answers a fixed acknowledgement without dispatching anything.
pub async fn broker_handler() -> (StatusCode, Json<ResponseEnvelope>) {
    (
        StatusCode::OK,
        Json(ResponseEnvelope::success("Hit the broker", None)),
    )
}

/// `POST /handle`: decodes an `ActionRequest`, dispatches it, and replies
/// with the normalized envelope.
///
/// The body is taken as raw bytes so that malformed JSON is answered with a
/// `BadRequest` envelope instead of axum's plain-text rejection.
pub async fn submission_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> (StatusCode, Json<ResponseEnvelope>) {
    let _ticket = state.lifecycle.track_dispatch();

    let req: ActionRequest = match serde_json::from_slice(&body) {
        Ok(req) => req,
        Err(e) => {
            debug!(error = %e, "rejecting undecodable submission");
            return failure(&DispatchError::BadRequest(format!("invalid request body: {e}")));
        }
    };

    match state.pipeline.call(req).await {
        Ok(envelope) => (StatusCode::ACCEPTED, Json(envelope)),
        Err(err) => failure(&err),
    }
}

/// HTTP status for each error class.
#[must_use]
pub fn status_for(err: &DispatchError) -> StatusCode {
    match err {
        DispatchError::UnknownAction { .. } | DispatchError::BadRequest(_) => {
            StatusCode::BAD_REQUEST
        }
        DispatchError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        DispatchError::TransportUnavailable { .. } | DispatchError::BackendError { .. } => {
            StatusCode::BAD_GATEWAY
        }
        DispatchError::Overloaded => StatusCode::SERVICE_UNAVAILABLE,
    }
}

fn failure(err: &DispatchError) -> (StatusCode, Json<ResponseEnvelope>) {
    (status_for(err), Json(ResponseEnvelope::from(err)))
}

#[cfg(test)]
mod tests {
    use broker_core::TransportKind;
    use serde_json::json;

    use super::*;
    use crate::dispatch::dispatcher::tests::{Canned, FakeBackend, Fakes};
    use crate::network::handlers::tests::test_state;

    fn body(value: &serde_json::Value) -> Bytes {
        Bytes::from(serde_json::to_vec(value).unwrap())
    }

    #[tokio::test]
    async fn broker_ping_is_ok() {
        let (status, Json(env)) = broker_handler().await;
        assert_eq!(status, StatusCode::OK);
        assert!(!env.is_error());
        assert_eq!(env.message(), "Hit the broker");
    }

    #[tokio::test]
    async fn mail_submission_is_accepted() {
        let fakes = Fakes::healthy();
        let (status, Json(env)) = submission_handler(
            State(test_state(&fakes)),
            body(&json!({
                "action": "mail",
                "mail": {"from": "me@example.com", "to": "a@b.com", "subject": "hi", "message": "hello"}
            })),
        )
        .await;

        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(env.message(), "Message sent to a@b.com");
        assert_eq!(fakes.mail.calls(), 1);
    }

    #[tokio::test]
    async fn log_with_empty_mail_sibling_is_dispatched() {
        let fakes = Fakes::healthy();
        let (status, Json(env)) = submission_handler(
            State(test_state(&fakes)),
            Bytes::from_static(br#"{"action":"log","log":{"name":"n","data":"d"},"mail":{}}"#),
        )
        .await;

        assert_eq!(status, StatusCode::ACCEPTED);
        assert!(!env.is_error());
        assert_eq!(fakes.log.calls(), 1);
        assert_eq!(fakes.mail.calls(), 0);
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let fakes = Fakes::healthy();
        let (status, Json(env)) =
            submission_handler(State(test_state(&fakes)), Bytes::from_static(b"{not json")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(env.is_error());
        assert_eq!(fakes.total_calls(), 0);
    }

    #[tokio::test]
    async fn unknown_action_is_bad_request() {
        let fakes = Fakes::healthy();
        let (status, Json(env)) =
            submission_handler(State(test_state(&fakes)), body(&json!({"action": "bogus"})))
                .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(env.message().contains("bogus"));
        assert_eq!(fakes.total_calls(), 0);
    }

    #[tokio::test]
    async fn unreachable_logger_is_bad_gateway() {
        let fakes = Fakes {
            log: FakeBackend::new(TransportKind::Grpc, Canned::Unavailable),
            ..Fakes::healthy()
        };
        let state = test_state(&fakes);
        let (status, Json(env)) = submission_handler(
            State(state.clone()),
            body(&json!({"action": "log", "log": {"name": "n", "data": "d"}})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(env.is_error());
        assert_eq!(state.lifecycle.in_flight(), 0);
    }

    #[test]
    fn status_per_error_class() {
        assert_eq!(
            status_for(&DispatchError::UnknownAction {
                action: "x".to_string()
            }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&DispatchError::BadRequest("x".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&DispatchError::InvalidCredentials),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_for(&DispatchError::TransportUnavailable {
                transport: TransportKind::Rpc,
                reason: "refused".to_string()
            }),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(&DispatchError::backend("boom")),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(&DispatchError::Overloaded),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
