//! Action dispatch: routes an `ActionRequest` to exactly one backend.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use broker_core::{ActionRequest, ActionTag, DispatchError, ResponseEnvelope, TransportKind};
use tower::Service;
use tracing::info;

use super::config::{DispatchConfig, LogRoute};
use super::normalize::{normalize, ReplyContext};
use crate::traits::{AuthBackend, LogTransport, MailBackend};
use crate::transport::{
    AmqpPublisher, AuthClient, GrpcLogTransport, HttpLogTransport, HttpTransport, MailClient,
    QueueLogTransport, RawReply, RpcLogTransport,
};

// ---------------------------------------------------------------------------
// Backends
// ---------------------------------------------------------------------------

/// One explicitly owned handle per backend capability.
///
/// Built once at startup and injected into the [`Dispatcher`]; never a
/// process-wide global.
#[derive(Clone)]
pub struct Backends {
    pub auth: Arc<dyn AuthBackend>,
    pub mail: Arc<dyn MailBackend>,
    pub log: Arc<dyn LogTransport>,
}

impl Backends {
    /// Builds the production backends for `config`.
    ///
    /// For the queue route this establishes the broker connection once; it is
    /// then shared by every publish.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or, for the queue
    /// route, the broker connection cannot be established.
    pub async fn connect(config: &DispatchConfig) -> anyhow::Result<Self> {
        let http = HttpTransport::new()?;

        let log: Arc<dyn LogTransport> = match &config.log {
            LogRoute::Http { url } => Arc::new(HttpLogTransport::new(http.clone(), url.clone())),
            LogRoute::Rpc { address } => Arc::new(RpcLogTransport::new(address.clone())),
            LogRoute::Grpc { address } => Arc::new(GrpcLogTransport::new(address.clone())),
            LogRoute::Queue { url, exchange } => {
                let publisher = AmqpPublisher::connect(url, exchange.clone()).await?;
                Arc::new(QueueLogTransport::new(publisher))
            }
        };

        let kind = config.log.kind();
        info!(
            log_transport = %kind,
            synchronous = kind.is_synchronous(),
            "backends configured"
        );

        Ok(Self {
            auth: Arc::new(AuthClient::new(http.clone(), config.auth_url.clone())),
            mail: Arc::new(MailClient::new(http, config.mail_url.clone())),
            log,
        })
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Routes each request to the one backend its action tag selects.
///
/// Holds no per-request state; concurrent dispatches share only the
/// immutable `Backends`. Cloning is cheap.
#[derive(Clone)]
pub struct Dispatcher {
    backends: Arc<Backends>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(backends: Backends) -> Self {
        Self {
            backends: Arc::new(backends),
        }
    }

    /// Wire protocol `log` actions are routed over.
    #[must_use]
    pub fn log_transport(&self) -> TransportKind {
        self.backends.log.kind()
    }

    /// Dispatches and folds any failure into an error envelope.
    pub async fn dispatch(&self, req: ActionRequest) -> ResponseEnvelope {
        match self.route(req).await {
            Ok(envelope) => envelope,
            Err(err) => ResponseEnvelope::from(&err),
        }
    }

    /// Dispatches the request, making exactly one transport call for a known
    /// action and none otherwise.
    ///
    /// # Errors
    ///
    /// - `UnknownAction` for an unrecognized tag (no call made)
    /// - `BadRequest` when the selected payload is missing or invalid (no call made)
    /// - any error produced by normalizing the transport outcome
    pub async fn route(&self, req: ActionRequest) -> Result<ResponseEnvelope, DispatchError> {
        match req.action {
            ActionTag::Auth => {
                let payload = req.auth.ok_or_else(|| missing_payload("auth"))?;
                payload.validate()?;
                let outcome = self
                    .backends
                    .auth
                    .authenticate(&payload)
                    .await
                    .map(RawReply::Http);
                normalize(ReplyContext::Auth, outcome)
            }
            ActionTag::Log => {
                let payload = req.log.ok_or_else(|| missing_payload("log"))?;
                let outcome = self.backends.log.write(&payload).await;
                normalize(ReplyContext::Log, outcome)
            }
            ActionTag::Mail => {
                let payload = req.mail.ok_or_else(|| missing_payload("mail"))?;
                let outcome = self.backends.mail.send(&payload).await.map(RawReply::Http);
                normalize(ReplyContext::Mail { to: &payload.to }, outcome)
            }
            ActionTag::Unknown(action) => Err(DispatchError::UnknownAction { action }),
        }
    }
}

fn missing_payload(action: &str) -> DispatchError {
    DispatchError::BadRequest(format!("missing {action} payload"))
}

impl Service<ActionRequest> for Dispatcher {
    type Response = ResponseEnvelope;
    type Error = DispatchError;
    type Future = Pin<Box<dyn Future<Output = Result<ResponseEnvelope, DispatchError>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: ActionRequest) -> Self::Future {
        let this = self.clone();
        Box::pin(async move { this.route(req).await })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
