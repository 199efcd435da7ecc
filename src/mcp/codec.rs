//! JSON-RPC framing for the Serena MCP endpoint
//!
//! Encoders build the four messages the client ever sends. The decoder
//! accepts both reply shapes the streamable HTTP transport produces: a plain
//! JSON document, or an event stream whose `data:` lines each carry one
//! JSON-RPC message. [`extract_result`] then peels the MCP tool-result
//! wrapper off a successful `result` member.

use serde_json::{json, Value};

use crate::error::{Result, SerenaError};
use crate::mcp::types::{
    CallToolParams, ClientCapabilities, Implementation, InitializeParams, JsonRpcNotification,
    JsonRpcRequest, METHOD_INITIALIZE, METHOD_INITIALIZED, METHOD_TOOLS_CALL, METHOD_TOOLS_LIST,
};

/// Prefix the server puts on an answer it refused to send in full.
pub const TRUNCATION_SENTINEL: &str = "The answer is too long";

/// Build the `initialize` request.
///
/// # Examples
///
/// ```
/// use serena_client::mcp::codec::encode_initialize;
///
/// let v = encode_initialize("serena-cli", "2.0.0", "2024-11-05", 1);
/// assert_eq!(v["method"], "initialize");
/// assert_eq!(v["params"]["clientInfo"]["version"], "2.0.0");
/// ```
pub fn encode_initialize(
    client_name: &str,
    client_version: &str,
    protocol_version: &str,
    id: u64,
) -> Value {
    let params = InitializeParams {
        protocol_version: protocol_version.to_string(),
        capabilities: ClientCapabilities::default(),
        client_info: Implementation {
            name: client_name.to_string(),
            version: client_version.to_string(),
        },
    };
    request(id, METHOD_INITIALIZE, serde_json::to_value(params).ok())
}

/// Build the `notifications/initialized` notification. It carries no id.
pub fn encode_initialized() -> Value {
    let notification = JsonRpcNotification {
        jsonrpc: "2.0".to_string(),
        method: METHOD_INITIALIZED.to_string(),
        params: None,
    };
    serde_json::to_value(notification).unwrap_or_else(|_| json!({}))
}

/// Build a `tools/call` request.
pub fn encode_call(tool_name: &str, arguments: Value, id: u64) -> Value {
    let params = CallToolParams {
        name: tool_name.to_string(),
        arguments,
    };
    request(id, METHOD_TOOLS_CALL, serde_json::to_value(params).ok())
}

/// Build a `tools/list` request with empty params.
pub fn encode_list_tools(id: u64) -> Value {
    request(id, METHOD_TOOLS_LIST, Some(json!({})))
}

fn request(id: u64, method: &str, params: Option<Value>) -> Value {
    serde_json::to_value(JsonRpcRequest::new(id, method, params)).unwrap_or_else(|_| json!({}))
}

/// Decode a response body into the JSON-RPC message answering `expected_id`.
///
/// Event-stream `data:` lines are scanned first, in order; the first one
/// whose payload has a matching `id` wins. Malformed lines and frames for
/// other ids are skipped. Failing that, the whole body is parsed as one JSON
/// document. Returns `None` when neither yields a value.
///
/// # Examples
///
/// ```
/// use serena_client::mcp::codec::decode_response;
///
/// let body = "data: {\"id\":1,\"result\":\"a\"}\n\ndata: {\"id\":2,\"result\":\"b\"}\n";
/// let v = decode_response(body, 2).unwrap();
/// assert_eq!(v["result"], "b");
/// ```
pub fn decode_response(raw_body: &str, expected_id: u64) -> Option<Value> {
    for line in raw_body.lines() {
        let Some(payload) = line.strip_prefix("data:") else {
            continue;
        };
        let Ok(message) = serde_json::from_str::<Value>(payload.trim()) else {
            continue;
        };
        if message.get("id").and_then(Value::as_u64) == Some(expected_id) {
            return Some(message);
        }
    }

    serde_json::from_str::<Value>(raw_body.trim()).ok()
}

/// Unwrap the payload of a `tools/call` result.
///
/// Handles the `structuredContent` shape (whose string `result` may hold a
/// second, encoded JSON document) and the `content` text-part shape. Any
/// other value is returned unchanged. A payload starting with
/// [`TRUNCATION_SENTINEL`] becomes a [`SerenaError::Tool`] carrying the
/// `--path` hint, attributed to `tool`.
pub fn extract_result(result: &Value, tool: &str) -> Result<Value> {
    if let Some(structured) = result.get("structuredContent") {
        return match structured.get("result") {
            Some(Value::String(text)) => {
                check_truncation(text, tool)?;
                Ok(serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.clone())))
            }
            Some(other) => Ok(other.clone()),
            None => Ok(structured.clone()),
        };
    }

    if let Some(parts) = result.get("content") {
        let text = parts
            .as_array()
            .map(|parts| {
                parts
                    .iter()
                    .filter(|p| p.get("type").and_then(Value::as_str) == Some("text"))
                    .map(|p| p.get("text").and_then(Value::as_str).unwrap_or(""))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default();
        check_truncation(&text, tool)?;
        return Ok(Value::String(text));
    }

    Ok(result.clone())
}

fn check_truncation(text: &str, tool: &str) -> Result<()> {
    if text.starts_with(TRUNCATION_SENTINEL) {
        return Err(SerenaError::truncated(tool).into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::hint_of;

    #[test]
    fn test_encode_initialize_shape() {
        let v = encode_initialize("serena-cli", "2.0.0", "2024-11-05", 7);
        assert_eq!(v["jsonrpc"], "2.0");
        assert_eq!(v["id"], 7);
        assert_eq!(v["params"]["protocolVersion"], "2024-11-05");
        assert_eq!(v["params"]["capabilities"], json!({}));
        assert_eq!(v["params"]["clientInfo"]["name"], "serena-cli");
    }

    #[test]
    fn test_encode_initialized_has_no_id() {
        let v = encode_initialized();
        assert_eq!(v["method"], "notifications/initialized");
        assert!(v.get("id").is_none());
        assert!(v.get("params").is_none());
    }

    #[test]
    fn test_encode_call_wraps_name_and_arguments() {
        let v = encode_call("find_symbol", json!({"name_path_pattern": "Customer"}), 3);
        assert_eq!(v["method"], "tools/call");
        assert_eq!(v["params"]["name"], "find_symbol");
        assert_eq!(v["params"]["arguments"]["name_path_pattern"], "Customer");
    }

    #[test]
    fn test_encode_list_tools_has_empty_params() {
        let v = encode_list_tools(4);
        assert_eq!(v["method"], "tools/list");
        assert_eq!(v["params"], json!({}));
    }

    #[test]
    fn test_decode_picks_frame_with_expected_id() {
        let body = "event: message\n\
                    data: {\"jsonrpc\":\"2.0\",\"id\":1,\"result\":\"first\"}\n\n\
                    data: {\"jsonrpc\":\"2.0\",\"id\":2,\"result\":\"second\"}\n\n";
        let v = decode_response(body, 2).unwrap();
        assert_eq!(v["result"], "second");
    }

    #[test]
    fn test_decode_skips_malformed_frames() {
        let body = "data: {not json\ndata: {\"id\":5,\"result\":true}\n";
        let v = decode_response(body, 5).unwrap();
        assert_eq!(v["result"], true);
    }

    #[test]
    fn test_decode_falls_back_to_plain_json() {
        let v = decode_response("{\"jsonrpc\":\"2.0\",\"id\":9,\"result\":{}}", 9).unwrap();
        assert_eq!(v["id"], 9);
    }

    #[test]
    fn test_decode_returns_none_for_garbage() {
        assert!(decode_response("data: nope\n", 1).is_none());
        assert!(decode_response("", 1).is_none());
    }

    #[test]
    fn test_extract_structured_double_encoded() {
        let result = json!({"structuredContent": {"result": "[{\"name_path\":\"Customer\"}]"}});
        let v = extract_result(&result, "find_symbol").unwrap();
        assert_eq!(v[0]["name_path"], "Customer");
    }

    #[test]
    fn test_extract_structured_plain_string_kept() {
        let result = json!({"structuredContent": {"result": "OK, activated"}});
        let v = extract_result(&result, "activate_project").unwrap();
        assert_eq!(v, json!("OK, activated"));
    }

    #[test]
    fn test_extract_structured_non_string_and_missing_result() {
        let v = extract_result(&json!({"structuredContent": {"result": [1, 2]}}), "t").unwrap();
        assert_eq!(v, json!([1, 2]));

        let v = extract_result(&json!({"structuredContent": {"count": 3}}), "t").unwrap();
        assert_eq!(v, json!({"count": 3}));
    }

    #[test]
    fn test_extract_structured_truncation_raises_with_hint() {
        let result = json!({"structuredContent": {"result": "The answer is too long: 400000 chars"}});
        let err = extract_result(&result, "search_for_pattern").unwrap_err();
        assert!(hint_of(&err).unwrap().contains("--path"));
        match err.downcast_ref::<SerenaError>() {
            Some(SerenaError::Tool { tool, .. }) => assert_eq!(tool, "search_for_pattern"),
            other => panic!("Expected Tool error, got {:?}", other),
        }
    }

    #[test]
    fn test_extract_text_content_joins_text_parts() {
        let result = json!({"content": [
            {"type": "text", "text": "line one"},
            {"type": "image", "data": "xx"},
            {"type": "text", "text": "line two"}
        ]});
        let v = extract_result(&result, "read_memory").unwrap();
        assert_eq!(v, json!("line one\nline two"));
    }

    #[test]
    fn test_extract_text_content_truncation() {
        let result = json!({"content": [{"type": "text", "text": "The answer is too long"}]});
        assert!(extract_result(&result, "find_symbol").is_err());
    }

    #[test]
    fn test_extract_other_shape_passthrough() {
        let v = extract_result(&json!({"tools": []}), "t").unwrap();
        assert_eq!(v, json!({"tools": []}));
    }
}
