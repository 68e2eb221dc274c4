use broker_core::TransportKind;

/// The single transport the `log` action is wired to in this deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogRoute {
    /// `POST` the entry as JSON to `url`.
    Http { url: String },
    /// Call `RPCServer.LogInfo` on the `host:port` at `address`.
    Rpc { address: String },
    /// Unary `WriteLog` on the gRPC endpoint URI at `address`.
    Grpc { address: String },
    /// Publish to the topic `exchange` on the AMQP broker at `url`.
    Queue { url: String, exchange: String },
}

impl LogRoute {
    /// Wire protocol of this route.
    #[must_use]
    pub fn kind(&self) -> TransportKind {
        match self {
            Self::Http { .. } => TransportKind::Http,
            Self::Rpc { .. } => TransportKind::Rpc,
            Self::Grpc { .. } => TransportKind::Grpc,
            Self::Queue { .. } => TransportKind::Queue,
        }
    }
}

/// Dispatcher configuration: backend endpoints and concurrency limit.
///
/// Endpoints are deployment-scoped, never request-scoped.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Maximum number of in-flight dispatches before load shedding.
    pub max_concurrent_dispatches: u32,
    /// Authentication backend endpoint.
    pub auth_url: String,
    /// Mail backend endpoint.
    pub mail_url: String,
    /// Where `log` actions go.
    pub log: LogRoute,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_concurrent_dispatches: 1000,
            auth_url: "http://authentication-service/authenticate".to_string(),
            mail_url: "http://mail-service/send".to_string(),
            log: LogRoute::Rpc {
                address: "logger-service:5001".to_string(),
            },
        }
    }
}
