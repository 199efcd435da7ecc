//! Pooled HTTP transport for the Serena MCP endpoint
//!
//! This module implements [`HttpTransport`], which POSTs every JSON-RPC
//! message to a single endpoint. The server may reply with a direct
//! `application/json` body, with a `text/event-stream` body carrying one or
//! more `data:` frames, or with `202 Accepted` for notifications. The body
//! is returned verbatim and decoded by [`crate::mcp::codec`].
//!
//! # Connection limits
//!
//! reqwest keeps an idle pool per host (`max_keepalive_connections`,
//! `keepalive_expiry_seconds`) but has no cap on total connections, so a
//! semaphore of `max_connections` permits bounds the requests in flight.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;

use crate::config::PoolConfig;
use crate::error::{Result, SerenaError};
use crate::mcp::transport::{HttpReply, Transport};
use crate::mcp::types::SESSION_HEADER;

/// Value of the `Accept` header sent on every POST.
const ACCEPT: &str = "application/json, text/event-stream";

/// Streamable HTTP transport with connection reuse.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use url::Url;
/// use serena_client::config::PoolConfig;
/// use serena_client::mcp::transport::http::HttpTransport;
///
/// let transport = HttpTransport::new(
///     Url::parse("http://localhost:9121/mcp").unwrap(),
///     Duration::from_secs(120),
///     &PoolConfig::default(),
/// )
/// .unwrap();
/// ```
#[derive(Debug)]
pub struct HttpTransport {
    /// Underlying reqwest HTTP client (owns the keep-alive pool).
    http_client: reqwest::Client,
    /// MCP endpoint URL (POST target).
    endpoint: url::Url,
    /// Bounds the number of requests in flight.
    permits: Arc<Semaphore>,
}

impl HttpTransport {
    /// Construct a new [`HttpTransport`] targeting `endpoint`.
    ///
    /// `timeout` bounds each request end to end. No network I/O is performed
    /// at construction time.
    ///
    /// # Errors
    ///
    /// Returns [`SerenaError::Connection`] if the HTTP client cannot be
    /// built (TLS backend initialisation failure).
    pub fn new(endpoint: url::Url, timeout: Duration, pool: &PoolConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(pool.max_keepalive_connections)
            .pool_idle_timeout(Duration::from_secs(pool.keepalive_expiry_seconds))
            .build()
            .map_err(|e| SerenaError::Connection(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            endpoint,
            permits: Arc::new(Semaphore::new(pool.max_connections)),
        })
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    /// POST `message` to the endpoint.
    ///
    /// Headers on every POST:
    ///
    /// - `Content-Type: application/json`
    /// - `Accept: application/json, text/event-stream`
    /// - `mcp-session-id: <id>` -- only when `session_id` is `Some`
    async fn post(&self, message: String, session_id: Option<&str>) -> Result<HttpReply> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| SerenaError::Connection(format!("connection pool closed: {}", e)))?;

        let mut req = self
            .http_client
            .post(self.endpoint.as_str())
            .header("Content-Type", "application/json")
            .header("Accept", ACCEPT)
            .body(message);

        if let Some(id) = session_id {
            req = req.header(SESSION_HEADER, id);
        }

        let response = req.send().await.map_err(|e| {
            let reason = if e.is_timeout() {
                "request timed out".to_string()
            } else {
                e.to_string()
            };
            SerenaError::Connection(format!("Cannot connect to Serena at {}: {}", self.endpoint, reason))
        })?;

        let status = response.status().as_u16();
        let session_id = response
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let body = response.text().await.map_err(|e| {
            SerenaError::Connection(format!("failed to read response body: {}", e))
        })?;

        tracing::trace!(status, bytes = body.len(), "POST {}", self.endpoint);

        Ok(HttpReply {
            status,
            session_id,
            body,
        })
    }

    fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }
}
