//! MCP protocol types and JSON-RPC 2.0 primitives
//!
//! This module defines the wire types the Serena client exchanges with the
//! server: JSON-RPC request and notification objects, the
//! `initialize` parameters, `tools/call` parameters and `tools/list`
//! descriptors. All `Option<>` fields omit their key from JSON when `None`.
//!
//! Replies are read as [`serde_json::Value`]: a tool result's shape belongs
//! to the remote tool, and [`crate::mcp::codec::extract_result`]
//! unwraps them.

use serde::{Deserialize, Serialize};
use std::time::Duration;

// ---------------------------------------------------------------------------
// Protocol constants
// ---------------------------------------------------------------------------

/// The MCP protocol revision announced during `initialize`.
pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

/// Client name announced during `initialize`.
pub const CLIENT_NAME: &str = "serena-cli";

/// Client version announced during `initialize`.
pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Response/request header carrying the negotiated session id.
pub const SESSION_HEADER: &str = "mcp-session-id";

/// Lifecycle: client sends `initialize` to open a session.
pub const METHOD_INITIALIZE: &str = "initialize";
/// Lifecycle: client sends `notifications/initialized` after the server ACKs.
pub const METHOD_INITIALIZED: &str = "notifications/initialized";
/// Request the list of available tools.
pub const METHOD_TOOLS_LIST: &str = "tools/list";
/// Invoke a named tool.
pub const METHOD_TOOLS_CALL: &str = "tools/call";

// ---------------------------------------------------------------------------
// JSON-RPC 2.0 wire types
// ---------------------------------------------------------------------------

/// A JSON-RPC 2.0 request object.
///
/// # Examples
///
/// ```
/// use serena_client::mcp::types::JsonRpcRequest;
///
/// let req = JsonRpcRequest::new(1, "tools/list", Some(serde_json::json!({})));
/// assert_eq!(req.jsonrpc, "2.0");
/// assert_eq!(req.id, 1);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// Protocol version identifier; always `"2.0"`.
    pub jsonrpc: String,
    /// Request correlation identifier.
    pub id: u64,
    /// The method name to invoke.
    pub method: String,
    /// Optional method parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl JsonRpcRequest {
    /// Build a `"2.0"` request.
    pub fn new(id: u64, method: impl Into<String>, params: Option<serde_json::Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            method: method.into(),
            params,
        }
    }
}

/// A JSON-RPC 2.0 notification (a request with no `id`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    /// Protocol version identifier; always `"2.0"`.
    pub jsonrpc: String,
    /// The notification method name.
    pub method: String,
    /// Optional notification parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Initialize types
// ---------------------------------------------------------------------------

/// Identifies a client or server implementation by name and version.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Implementation {
    /// Short name of the implementation (e.g. `"serena-cli"`).
    pub name: String,
    /// Semantic version string.
    pub version: String,
}

/// Capabilities advertised by this client. The client advertises none, so
/// the struct serializes to `{}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientCapabilities {}

/// Parameters sent by the client in the `initialize` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    /// The protocol version the client wishes to use.
    pub protocol_version: String,
    /// Capabilities advertised by this client.
    pub capabilities: ClientCapabilities,
    /// Information identifying this client implementation.
    pub client_info: Implementation,
}

// ---------------------------------------------------------------------------
// Tool types
// ---------------------------------------------------------------------------

/// Parameters for a `tools/call` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallToolParams {
    /// Name of the tool to invoke.
    pub name: String,
    /// Arguments to pass to the tool.
    pub arguments: serde_json::Value,
}

/// A tool descriptor as returned by `tools/list`.
///
/// Only the fields the client surfaces are kept; the input schema is
/// ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolInfo {
    /// Unique name of the tool within the server.
    #[serde(default)]
    pub name: String,
    /// Human-readable description of the tool's purpose.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Response to a `tools/list` request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListToolsResponse {
    /// Tools offered by the server.
    #[serde(default)]
    pub tools: Vec<ToolInfo>,
}

/// Result of a single successful tool invocation.
///
/// Produced once per call by [`crate::mcp::client::SerenaClient::call_tool`];
/// never persisted.
#[derive(Debug, Clone)]
pub struct ToolResult {
    /// The unwrapped payload.
    pub data: serde_json::Value,
    /// The tool that produced it.
    pub tool: String,
    /// Wall-clock time spent on the HTTP round trip.
    pub elapsed: Duration,
    /// JSON-RPC id of the request.
    pub request_id: u64,
}

impl ToolResult {
    /// Elapsed time in fractional milliseconds.
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_serializes_without_params_when_none() {
        let req = JsonRpcRequest::new(3, METHOD_TOOLS_LIST, None);
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v, json!({"jsonrpc": "2.0", "id": 3, "method": "tools/list"}));
    }

    #[test]
    fn test_initialize_params_are_camel_case() {
        let params = InitializeParams {
            protocol_version: MCP_PROTOCOL_VERSION.to_string(),
            capabilities: ClientCapabilities::default(),
            client_info: Implementation {
                name: "serena-cli".to_string(),
                version: "2.0.0".to_string(),
            },
        };
        let v = serde_json::to_value(&params).unwrap();
        assert_eq!(v["protocolVersion"], "2024-11-05");
        assert_eq!(v["capabilities"], json!({}));
        assert_eq!(v["clientInfo"]["name"], "serena-cli");
    }

    #[test]
    fn test_tool_info_tolerates_null_description() {
        let list: ListToolsResponse = serde_json::from_value(json!({
            "tools": [
                {"name": "find_symbol", "description": null, "inputSchema": {}},
                {"name": "onboarding"}
            ]
        }))
        .unwrap();
        assert_eq!(list.tools.len(), 2);
        assert_eq!(list.tools[0].description, "");
        assert_eq!(list.tools[1].name, "onboarding");
    }

    #[test]
    fn test_tool_result_elapsed_ms() {
        let r = ToolResult {
            data: json!(null),
            tool: "x".to_string(),
            elapsed: Duration::from_millis(1500),
            request_id: 1,
        };
        assert!((r.elapsed_ms() - 1500.0).abs() < f64::EPSILON);
    }
}
