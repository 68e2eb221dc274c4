//! Health, liveness and readiness endpoints.
//!
//! `/health` and `/health/ready` answer with the same `{error, message, data}`
//! envelope as submissions, so callers parse one shape everywhere.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use broker_core::ResponseEnvelope;
use serde_json::json;

use super::AppState;
use crate::network::Phase;

/// Reports phase, in-flight dispatches, spare dispatch capacity, and the log
/// route. Always 200.
pub async fn health_handler(State(state): State<AppState>) -> Json<ResponseEnvelope> {
    let phase = state.lifecycle.phase();
    let log_transport = state.lifecycle.log_transport();
    let log_delivery = if log_transport.is_synchronous() {
        "acknowledged"
    } else {
        "fire-and-forget"
    };

    Json(ResponseEnvelope::success(
        format!("broker {}", phase.as_str()),
        Some(json!({
            "phase": phase.as_str(),
            "in_flight": state.lifecycle.in_flight(),
            "dispatch_capacity": state.pipeline.available_permits(),
            "log_transport": log_transport.as_str(),
            "log_delivery": log_delivery,
            "uptime_secs": state.start_time.elapsed().as_secs(),
        })),
    ))
}

/// Answers 200 while the process can run a handler at all.
pub async fn liveness_handler() -> StatusCode {
    StatusCode::OK
}

/// 200 only while serving; 503 before the listener is up and once draining
/// has begun.
pub async fn readiness_handler(
    State(state): State<AppState>,
) -> (StatusCode, Json<ResponseEnvelope>) {
    match state.lifecycle.phase() {
        Phase::Serving => (
            StatusCode::OK,
            Json(ResponseEnvelope::success(
                "ready",
                Some(json!({"log_transport": state.lifecycle.log_transport().as_str()})),
            )),
        ),
        phase => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ResponseEnvelope::failure(format!(
                "broker is {}",
                phase.as_str()
            ))),
        ),
    }
}
