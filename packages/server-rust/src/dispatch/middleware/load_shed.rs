//! Load-shedding middleware for dispatches.
//!
//! Rejects a dispatch with `DispatchError::Overloaded` when the number of
//! in-flight dispatches already equals `max_concurrent_dispatches`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use broker_core::{ActionRequest, DispatchError, ResponseEnvelope};
use tokio::sync::Semaphore;
use tower::{Layer, Service};

// ---------------------------------------------------------------------------
// LoadShedLayer
// ---------------------------------------------------------------------------

/// Tower layer that limits concurrent dispatches via a semaphore.
///
/// When all permits are taken, incoming requests are rejected immediately
/// rather than queued. Clones share the same permits.
#[derive(Debug, Clone)]
pub struct LoadShedLayer {
    semaphore: Arc<Semaphore>,
}

impl LoadShedLayer {
    #[must_use]
    pub fn new(max_concurrent: u32) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent as usize)),
        }
    }

    /// Dispatches that could still start right now.
    #[must_use]
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}

impl<S> Layer<S> for LoadShedLayer {
    type Service = LoadShedService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        LoadShedService {
            inner,
            semaphore: self.semaphore.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// LoadShedService
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct LoadShedService<S> {
    inner: S,
    semaphore: Arc<Semaphore>,
}

impl<S> Service<ActionRequest> for LoadShedService<S>
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
        let Ok(permit) = self.semaphore.clone().try_acquire_owned() else {
            tracing::warn!(action = %req.action, "dispatch shed: broker overloaded");
            return Box::pin(async { Err(DispatchError::Overloaded) });
        };

        let fut = self.inner.call(req);
        Box::pin(async move {
            // Permit is held until the transport call has finished.
            let result = fut.await;
            drop(permit);
            result
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
