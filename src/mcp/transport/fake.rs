//! Scripted in-process fake transport for unit tests
//!
//! This module provides [`FakeTransport`] and [`FakeTransportHandle`], an
//! in-process pair that replaces real network I/O in tests.
//!
//! # Usage
//!
//! Call [`FakeTransport::new`] to obtain a `(FakeTransport, FakeTransportHandle)`
//! pair. Script the replies the "server" will give, in order, with the
//! `inject_*` helpers, then wire the transport into the code under test. From
//! the test side, drain [`FakeTransportHandle::outbound_rx`] to assert on
//! what the client posted.
//!
//! ```text
//! client post() -----> outbound_tx -----> outbound_rx (handle reads)
//! inject_*()    -----> replies     -----> next post() returns it
//! ```
//!
//! A `post` with no scripted reply left fails with
//! [`SerenaError::Connection`], as if the server had gone away.

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::sync::{mpsc, Mutex};

use crate::error::{Result, SerenaError};
use crate::mcp::transport::{HttpReply, Transport};

/// One message the client posted.
#[derive(Debug, Clone)]
pub struct SentMessage {
    /// Parsed JSON-RPC body.
    pub body: Value,
    /// `mcp-session-id` header sent with it.
    pub session_id: Option<String>,
}

/// A scripted outcome for one `post`.
#[derive(Debug, Clone)]
pub enum FakeReply {
    /// The server answered.
    Reply(HttpReply),
    /// The request never reached the server.
    Unreachable,
}

/// In-process fake transport for use in tests.
#[derive(Debug)]
pub struct FakeTransport {
    outbound_tx: mpsc::UnboundedSender<SentMessage>,
    replies_tx: mpsc::UnboundedSender<FakeReply>,
    replies_rx: Arc<Mutex<mpsc::UnboundedReceiver<FakeReply>>>,
}

/// The test-side handle for a [`FakeTransport`].
#[derive(Debug)]
pub struct FakeTransportHandle {
    /// Receives every message the client posted, in order.
    pub outbound_rx: mpsc::UnboundedReceiver<SentMessage>,
}

impl FakeTransportHandle {
    /// Drain every message posted so far.
    pub fn drain(&mut self) -> Vec<SentMessage> {
        let mut sent = Vec::new();
        while let Ok(msg) = self.outbound_rx.try_recv() {
            sent.push(msg);
        }
        sent
    }
}

impl FakeTransport {
    /// Create a new `(FakeTransport, FakeTransportHandle)` pair.
    pub fn new() -> (Self, FakeTransportHandle) {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (replies_tx, replies_rx) = mpsc::unbounded_channel();
        let transport = Self {
            outbound_tx,
            replies_tx,
            replies_rx: Arc::new(Mutex::new(replies_rx)),
        };
        (transport, FakeTransportHandle { outbound_rx })
    }

    /// Queue a raw scripted outcome.
    pub fn inject(&self, reply: FakeReply) {
        // The receiver lives in `self`, so the channel cannot be closed here.
        let _ = self.replies_tx.send(reply);
    }

    /// Queue a reply with the given status and body.
    pub fn inject_status(&self, status: u16, body: &str) {
        self.inject(FakeReply::Reply(HttpReply {
            status,
            session_id: None,
            body: body.to_string(),
        }));
    }

    /// Queue a successful `initialize` reply carrying `session_id`, followed
    /// by the `202 Accepted` for the `initialized` notification.
    pub fn inject_handshake(&self, session_id: &str) {
        self.inject(FakeReply::Reply(HttpReply {
            status: 200,
            session_id: Some(session_id.to_string()),
            body: json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": {"protocolVersion": "2024-11-05", "capabilities": {}}
            })
            .to_string(),
        }));
        self.inject_status(202, "");
    }

    /// Queue a plain-JSON `result` reply.
    pub fn inject_result(&self, result: Value) {
        self.inject_status(200, &json!({"jsonrpc": "2.0", "result": result}).to_string());
    }

    /// Queue a tool result in the `structuredContent` shape, with `data`
    /// encoded as a JSON string the way Serena sends it.
    pub fn inject_structured(&self, data: Value) {
        self.inject_result(json!({"structuredContent": {"result": data.to_string()}}));
    }

    /// Queue a tool result in the text-content shape.
    pub fn inject_text(&self, text: &str) {
        self.inject_result(json!({"content": [{"type": "text", "text": text}]}));
    }

    /// Queue a JSON-RPC error reply.
    pub fn inject_rpc_error(&self, code: i64, message: &str) {
        self.inject_status(
            200,
            &json!({"jsonrpc": "2.0", "error": {"code": code, "message": message}}).to_string(),
        );
    }
}

#[async_trait::async_trait]
impl Transport for FakeTransport {
    async fn post(&self, message: String, session_id: Option<&str>) -> Result<HttpReply> {
        let body = serde_json::from_str(&message).unwrap_or(Value::String(message));
        let _ = self.outbound_tx.send(SentMessage {
            body,
            session_id: session_id.map(str::to_string),
        });

        match self.replies_rx.lock().await.try_recv() {
            Ok(FakeReply::Reply(reply)) => Ok(reply),
            Ok(FakeReply::Unreachable) | Err(_) => {
                Err(SerenaError::Connection("fake server unreachable".to_string()).into())
            }
        }
    }

    fn endpoint(&self) -> &str {
        "http://fake.invalid/mcp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_post_records_message_and_session() {
        let (transport, mut handle) = FakeTransport::new();
        transport.inject_status(202, "");

        let reply = transport
            .post(r#"{"method":"ping"}"#.to_string(), Some("s1"))
            .await
            .unwrap();
        assert_eq!(reply.status, 202);

        let sent = handle.drain();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].body["method"], "ping");
        assert_eq!(sent[0].session_id.as_deref(), Some("s1"));
    }

    #[tokio::test]
    async fn test_replies_are_returned_in_order() {
        let (transport, _handle) = FakeTransport::new();
        transport.inject_handshake("abc");

        let first = transport.post("{}".to_string(), None).await.unwrap();
        assert_eq!(first.session_id.as_deref(), Some("abc"));
        let second = transport.post("{}".to_string(), Some("abc")).await.unwrap();
        assert_eq!(second.status, 202);
    }

    #[tokio::test]
    async fn test_exhausted_script_is_connection_error() {
        let (transport, _handle) = FakeTransport::new();
        transport.inject(FakeReply::Unreachable);

        for _ in 0..2 {
            let err = transport.post("{}".to_string(), None).await.unwrap_err();
            assert!(matches!(
                err.downcast_ref::<SerenaError>(),
                Some(SerenaError::Connection(_))
            ));
        }
    }

    #[test]
    fn test_fake_transport_is_object_safe() {
        let (transport, _handle) = FakeTransport::new();
        let _boxed: Box<dyn Transport> = Box::new(transport);
    }
}
