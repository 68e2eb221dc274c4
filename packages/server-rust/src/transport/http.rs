//! JSON-over-HTTP transport and the backends reached through it.

use async_trait::async_trait;
use broker_core::{AuthPayload, LogPayload, MailPayload, TransportKind};
use bytes::Bytes;
use http::StatusCode;
use serde::Serialize;
use tracing::{debug, warn};

use super::{RawReply, TransportError};
use crate::traits::{AuthBackend, LogTransport, MailBackend};

// ---------------------------------------------------------------------------
// HttpTransport
// ---------------------------------------------------------------------------

/// Status and fully-read body of one backend reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: StatusCode,
    pub body: Bytes,
}

/// Issues one JSON `POST` per call and reads the reply body to the end.
///
/// Idle pooling is disabled, so the connection used by a call is closed once
/// the body has been read instead of being parked for the next dispatch.
/// Cloning shares the underlying client configuration.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Builds the transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized (e.g. TLS
    /// backend failure).
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(0)
            .build()?;
        Ok(Self { client })
    }

    /// Serializes `payload` as the request body (`Content-Type:
    /// application/json`), sends it, and waits for the complete reply.
    ///
    /// Any HTTP status is a successful transport call; interpreting it is the
    /// normalizer's job. There is no deadline beyond the client's own.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Unavailable` on DNS, connect, or I/O failure
    /// while sending the request or reading the body.
    pub async fn post_json<T>(&self, url: &str, payload: &T) -> Result<HttpReply, TransportError>
    where
        T: Serialize + Sync + ?Sized,
    {
        debug!(url, "posting to HTTP backend");

        let response = self
            .client
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                warn!(url, error = %e, "HTTP backend unreachable");
                TransportError::unavailable(TransportKind::Http, e)
            })?;

        let status = response.status();
        // `bytes()` consumes the response, so the body is drained and the
        // connection released before the reply is inspected.
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::unavailable(TransportKind::Http, e))?;

        debug!(url, status = status.as_u16(), "HTTP backend replied");
        Ok(HttpReply { status, body })
    }
}

// ---------------------------------------------------------------------------
// Backends over HTTP
// ---------------------------------------------------------------------------

/// Authentication backend reached at `POST <url>` (normally `/authenticate`).
#[derive(Debug, Clone)]
pub struct AuthClient {
    http: HttpTransport,
    url: String,
}

impl AuthClient {
    #[must_use]
    pub fn new(http: HttpTransport, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }
}

#[async_trait]
impl AuthBackend for AuthClient {
    async fn authenticate(&self, payload: &AuthPayload) -> Result<HttpReply, TransportError> {
        self.http.post_json(&self.url, payload).await
    }
}

/// Mail backend reached at `POST <url>` (normally `/send`).
#[derive(Debug, Clone)]
pub struct MailClient {
    http: HttpTransport,
    url: String,
}

impl MailClient {
    #[must_use]
    pub fn new(http: HttpTransport, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }
}

#[async_trait]
impl MailBackend for MailClient {
    async fn send(&self, payload: &MailPayload) -> Result<HttpReply, TransportError> {
        self.http.post_json(&self.url, payload).await
    }
}

/// Log route over HTTP: `POST <url>` (normally `/log`).
#[derive(Debug, Clone)]
pub struct HttpLogTransport {
    http: HttpTransport,
    url: String,
}

impl HttpLogTransport {
    #[must_use]
    pub fn new(http: HttpTransport, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }
}

#[async_trait]
impl LogTransport for HttpLogTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Http
    }

    async fn write(&self, entry: &LogPayload) -> Result<RawReply, TransportError> {
        self.http.post_json(&self.url, entry).await.map(RawReply::Http)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
