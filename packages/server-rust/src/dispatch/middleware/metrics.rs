//! Dispatch instrumentation via `tracing` spans.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use broker_core::{ActionRequest, DispatchError, ResponseEnvelope};
use tower::{Layer, Service};
use tracing::{info_span, Instrument};

// ---------------------------------------------------------------------------
// MetricsLayer
// ---------------------------------------------------------------------------

/// Tower layer that records each dispatch's action, duration, and outcome.
#[derive(Debug, Clone)]
pub struct MetricsLayer;

impl<S> Layer<S> for MetricsLayer {
    type Service = MetricsService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MetricsService { inner }
    }
}

// ---------------------------------------------------------------------------
// MetricsService
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct MetricsService<S> {
    inner: S,
}

impl<S> Service<ActionRequest> for MetricsService<S>
where
    S: Service<ActionRequest, Response = ResponseEnvelope, Error = DispatchError> + Send,
    S::Future: Send + 'static,
{
    type Response = ResponseEnvelope;
    type Error = DispatchError;
    type Future = Pin<Box<dyn Future<Output = Result<ResponseEnvelope, DispatchError>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: ActionRequest) -> Self::Future {
        let action = req.action.as_str().to_string();

        let span = info_span!(
            "dispatch",
            action = %action,
            duration_ms = tracing::field::Empty,
            outcome = tracing::field::Empty,
        );

        let fut = self.inner.call(req);

        Box::pin(
            async move {
                let start = Instant::now();
                let result = fut.await;

                #[allow(clippy::cast_possible_truncation)]
                let duration_ms = start.elapsed().as_millis() as u64;
                let outcome = match &result {
                    Ok(_) => "ok",
                    Err(err) => err.kind(),
                };

                tracing::Span::current().record("duration_ms", duration_ms);
                tracing::Span::current().record("outcome", outcome);

                match &result {
                    Ok(_) => tracing::info!(action = %action, duration_ms, "dispatch complete"),
                    Err(err) => tracing::warn!(
                        action = %action,
                        duration_ms,
                        outcome,
                        error = %err,
                        "dispatch failed"
                    ),
                }

                result
            }
            .instrument(span),
        )
    }
}

#[cfg(test)]
mod tests {
    use broker_core::ActionTag;
    use tower::ServiceExt;

    use super::*;

    struct ImmediateService;

    impl Service<ActionRequest> for ImmediateService {
        type Response = ResponseEnvelope;
        type Error = DispatchError;
        type Future =
            Pin<Box<dyn Future<Output = Result<ResponseEnvelope, DispatchError>> + Send>>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, req: ActionRequest) -> Self::Future {
            Box::pin(async move {
                match req.action {
                    ActionTag::Unknown(action) => Err(DispatchError::UnknownAction { action }),
                    tag => Ok(ResponseEnvelope::success(tag.as_str().to_string(), None)),
                }
            })
        }
    }

    fn request(action: &str) -> ActionRequest {
        ActionRequest {
            action: ActionTag::from(action),
            auth: None,
            log: None,
            mail: None,
        }
    }

    #[tokio::test]
    async fn passes_through_response() {
        let env = MetricsLayer
            .layer(ImmediateService)
            .oneshot(request("mail"))
            .await
            .unwrap();
        assert_eq!(env.message(), "mail");
    }

    #[tokio::test]
    async fn passes_through_error() {
        let err = MetricsLayer
            .layer(ImmediateService)
            .oneshot(request("bogus"))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::UnknownAction { .. }));
    }
}
