//! Session-aware Serena MCP client
//!
//! This module provides [`SerenaClient`], which negotiates (or reuses) an MCP
//! session, dispatches `tools/call` requests and turns replies into
//! [`ToolResult`]s or typed [`SerenaError`]s. The typed operation set
//! (`find_symbol`, `memory_read`, ...) lives in [`crate::ops`] as further
//! `impl SerenaClient` blocks.
//!
//! # Design
//!
//! - Every method takes `&self`; the session and transport sit behind a
//!   short-lived `std::sync::Mutex` that is never held across an `.await`, so
//!   one client can be shared through an `Arc` by the HTTP proxy.
//! - Request ids come from a per-instance [`AtomicU64`] starting at 1 and
//!   never repeat for the lifetime of the client.
//! - The session is touched in memory on every successful call and written
//!   back to the [`SessionStore`] by [`SerenaClient::close`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use serde_json::{json, Value};

use crate::config::ServerConfig;
use crate::error::{Result, SerenaError};
use crate::mcp::codec;
use crate::mcp::session::{Session, SessionStore};
use crate::mcp::transport::http::HttpTransport;
use crate::mcp::transport::{HttpReply, Transport};
use crate::mcp::types::{
    ListToolsResponse, ToolInfo, ToolResult, CLIENT_NAME, CLIENT_VERSION,
    MCP_PROTOCOL_VERSION, METHOD_TOOLS_LIST,
};

#[derive(Debug, Default)]
struct ClientState {
    transport: Option<Arc<dyn Transport>>,
    session: Option<Session>,
}

/// Async client for one Serena MCP endpoint.
///
/// # Examples
///
/// ```no_run
/// use serena_client::config::Config;
/// use serena_client::mcp::client::SerenaClient;
///
/// # #[tokio::main]
/// # async fn main() -> anyhow::Result<()> {
/// let config = Config::default();
/// let client = SerenaClient::new(config.server.clone(), config.session.store());
/// client.connect().await?;
/// let status = client.get_status().await?;
/// println!("{}", status);
/// client.close();
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SerenaClient {
    server: ServerConfig,
    store: SessionStore,
    /// Transport injected by tests; `None` builds an [`HttpTransport`].
    preset: Option<Arc<dyn Transport>>,
    state: Mutex<ClientState>,
    next_id: AtomicU64,
}

impl SerenaClient {
    /// Client for `server`, persisting sessions in `store`.
    ///
    /// No network I/O happens until [`SerenaClient::connect`].
    pub fn new(server: ServerConfig, store: SessionStore) -> Self {
        Self {
            server,
            store,
            preset: None,
            state: Mutex::new(ClientState::default()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Client that talks through `transport` instead of building its own.
    pub fn with_transport(
        server: ServerConfig,
        store: SessionStore,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            preset: Some(transport),
            ..Self::new(server, store)
        }
    }

    /// Endpoint URL, also the session store key.
    pub fn url(&self) -> &str {
        &self.server.url
    }

    /// The session store this client persists to.
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Snapshot of the active session.
    pub fn session(&self) -> Option<Session> {
        self.state().session.clone()
    }

    /// Whether a transport and a session are both in place.
    pub fn is_connected(&self) -> bool {
        let state = self.state();
        state.transport.is_some() && state.session.is_some()
    }

    fn state(&self) -> MutexGuard<'_, ClientState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Acquire the transport, then adopt a stored session or negotiate one.
    ///
    /// # Errors
    ///
    /// - [`SerenaError::Connection`] if the endpoint is unreachable or the
    ///   `initialize` POST gets a non-success status
    /// - [`SerenaError::Session`] if the server does not return an
    ///   `mcp-session-id` header
    pub async fn connect(&self) -> Result<()> {
        let transport = self.acquire_transport()?;
        self.state().transport = Some(Arc::clone(&transport));

        if let Some(existing) = self.store.get(&self.server.url) {
            tracing::debug!(session_id = %existing.session_id, "reusing stored session");
            self.state().session = Some(existing);
            return Ok(());
        }

        let session = self.handshake(transport.as_ref()).await?;
        self.state().session = Some(session);
        Ok(())
    }

    fn acquire_transport(&self) -> Result<Arc<dyn Transport>> {
        if let Some(ref preset) = self.preset {
            return Ok(Arc::clone(preset));
        }
        let transport =
            HttpTransport::new(self.server.endpoint()?, self.server.timeout(), &self.server.pool)?;
        Ok(Arc::new(transport))
    }

    async fn handshake(&self, transport: &dyn Transport) -> Result<Session> {
        let id = self.next_id();
        let request =
            codec::encode_initialize(CLIENT_NAME, CLIENT_VERSION, MCP_PROTOCOL_VERSION, id);
        let reply = transport.post(request.to_string(), None).await?;

        if !reply.is_success() {
            return Err(SerenaError::Connection(format!(
                "HTTP {} from Serena at {} during initialize",
                reply.status,
                transport.endpoint()
            ))
            .into());
        }

        let session_id = reply
            .session_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| SerenaError::Session("Server did not return session ID".to_string()))?;

        let mut session = Session::new(session_id, self.server.url.clone());

        let ack = transport
            .post(
                codec::encode_initialized().to_string(),
                Some(&session.session_id),
            )
            .await?;
        if !ack.is_success() {
            tracing::warn!(status = ack.status, "initialized notification was not accepted");
        }

        if let Err(e) = self.store.save(&mut session) {
            tracing::warn!("failed to persist session: {}", e);
        }

        tracing::info!(session_id = %session.session_id, url = %transport.endpoint(), "MCP session initialized");
        Ok(session)
    }

    /// Persist the current session and release the transport.
    ///
    /// Safe to call when [`SerenaClient::connect`] never succeeded.
    pub fn close(&self) {
        let mut state = self.state();
        if let Some(ref mut session) = state.session {
            if let Err(e) = self.store.save(session) {
                tracing::warn!("failed to persist session: {}", e);
            }
        }
        state.transport = None;
    }

    fn active(&self) -> Result<(Arc<dyn Transport>, String)> {
        let state = self.state();
        match (&state.transport, &state.session) {
            (Some(transport), Some(session)) => {
                Ok((Arc::clone(transport), session.session_id.clone()))
            }
            _ => Err(
                SerenaError::Session("Not connected. Call connect() first.".to_string()).into(),
            ),
        }
    }

    /// POST one request and decode the reply addressed to `id`.
    ///
    /// A 404 with an active session means the server forgot it: the stored
    /// session is dropped and a [`SerenaError::Session`] returned.
    ///
    /// Any `error` member fails the call, whatever its shape. Otherwise the
    /// `result` member is returned, or an empty object when there is none.
    async fn exchange(&self, label: &str, request: Value, id: u64) -> Result<Value> {
        let (transport, session_id) = self.active()?;
        let reply: HttpReply = transport.post(request.to_string(), Some(&session_id)).await?;

        if reply.status == 404 {
            self.state().session = None;
            if let Err(e) = self.store.clear(&self.server.url) {
                tracing::warn!("failed to clear expired session: {}", e);
            }
            return Err(SerenaError::Session("session expired".to_string()).into());
        }

        if !reply.is_success() {
            return Err(SerenaError::tool(label, format!("HTTP error: {}", reply.status)).into());
        }

        let mut message = codec::decode_response(&reply.body, id).unwrap_or_else(|| {
            tracing::warn!(tool = label, id, "undecodable response body, treating as empty");
            json!({})
        });

        match message.get_mut("error").map(Value::take) {
            None | Some(Value::Null) => {}
            Some(error) => return Err(rpc_error(label, error).into()),
        }

        Ok(match message.get_mut("result").map(Value::take) {
            None | Some(Value::Null) => json!({}),
            Some(result) => result,
        })
    }

    /// Invoke tool `name` with `arguments`.
    ///
    /// # Errors
    ///
    /// - [`SerenaError::Session`] without an active session, or when the
    ///   server reports the session expired (HTTP 404)
    /// - [`SerenaError::Connection`] when the request cannot be delivered
    /// - [`SerenaError::Tool`] for any other non-success status, a JSON-RPC
    ///   `error` member, or a truncated answer
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolResult> {
        let id = self.next_id();
        let started = Instant::now();
        let result = self
            .exchange(name, codec::encode_call(name, arguments, id), id)
            .await?;
        let elapsed = started.elapsed();

        let data = codec::extract_result(&result, name)?;

        if let Some(ref mut session) = self.state().session {
            session.touch();
        }

        let result = ToolResult {
            data,
            tool: name.to_string(),
            elapsed,
            request_id: id,
        };
        tracing::debug!(
            tool = name,
            id,
            elapsed_ms = result.elapsed_ms(),
            "tool call complete"
        );
        Ok(result)
    }

    /// Tools the server offers, as `{name, description}` pairs.
    pub async fn list_tools(&self) -> Result<Vec<ToolInfo>> {
        let id = self.next_id();
        let result = self
            .exchange(METHOD_TOOLS_LIST, codec::encode_list_tools(id), id)
            .await?;

        let listed: ListToolsResponse = serde_json::from_value(result).unwrap_or_default();
        Ok(listed.tools)
    }
}

/// Turn a JSON-RPC `error` member into a tool failure.
///
/// Well-formed errors carry `code`, `message` and `data`. A bare string is
/// taken as the message; anything else is reported as its JSON text.
fn rpc_error(tool: &str, error: Value) -> SerenaError {
    let (message, code, data) = match error {
        Value::String(message) => (message, None, None),
        Value::Object(mut fields) => {
            let code = fields.get("code").and_then(Value::as_i64);
            let data = fields.remove("data").filter(|d| !d.is_null());
            let message = match fields.remove("message") {
                Some(Value::String(m)) => m,
                Some(other) => other.to_string(),
                None => Value::Object(fields).to_string(),
            };
            (message, code, data)
        }
        other => (other.to_string(), None, None),
    };
    SerenaError::Tool {
        tool: tool.to_string(),
        message,
        code,
        data,
        hint: None,
    }
}
