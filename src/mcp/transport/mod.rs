//! Transport abstraction for the Serena MCP endpoint
//!
//! This module defines the [`Transport`] trait the client talks through.
//! Concrete implementations live in submodules:
//!
//! - [`http::HttpTransport`] -- pooled reqwest client issuing one POST per
//!   JSON-RPC message.
//! - [`fake::FakeTransport`] -- scripted in-process fake used in tests
//!   (cfg(test) only).
//!
//! # Design
//!
//! Streamable HTTP is strictly request/reply from the client's side: every
//! message is a POST and every POST yields exactly one reply. The trait
//! therefore exposes a single `post` that returns the raw status, the
//! session header and the body. Framing is left to
//! [`crate::mcp::codec`], and session bookkeeping to the client.

use crate::error::Result;

/// Raw reply to one POST.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpReply {
    /// HTTP status code.
    pub status: u16,
    /// Value of the `mcp-session-id` response header, if present.
    pub session_id: Option<String>,
    /// Response body as text (plain JSON or an event stream).
    pub body: String,
}

impl HttpReply {
    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Abstraction over the channel to the Serena MCP endpoint.
///
/// Used polymorphically through `Arc<dyn Transport>` so tests can swap in
/// [`fake::FakeTransport`].
#[async_trait::async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// POST one serialized JSON-RPC message.
    ///
    /// # Arguments
    ///
    /// * `message` - A complete JSON-RPC request or notification.
    /// * `session_id` - Sent as the `mcp-session-id` header when `Some`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::SerenaError::Connection`] when the request
    /// could not be delivered or timed out. Non-2xx statuses are NOT errors
    /// at this layer; they come back in [`HttpReply::status`].
    async fn post(&self, message: String, session_id: Option<&str>) -> Result<HttpReply>;

    /// The endpoint this transport posts to.
    fn endpoint(&self) -> &str;
}

pub mod http;

#[cfg(test)]
pub mod fake;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_success_range() {
        let mut reply = HttpReply {
            status: 200,
            ..Default::default()
        };
        assert!(reply.is_success());
        reply.status = 202;
        assert!(reply.is_success());
        reply.status = 404;
        assert!(!reply.is_success());
        reply.status = 500;
        assert!(!reply.is_success());
    }
}
