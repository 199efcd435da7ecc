//! Error types for the Serena client
//!
//! This module defines all error types used throughout the crate, using
//! `thiserror` for ergonomic error handling. Fallible functions return the
//! [`Result`] alias; callers that need the typed failure downcast the
//! `anyhow::Error` to [`SerenaError`].

use thiserror::Error;

/// Hint attached to truncated results.
pub const TRUNCATION_HINT: &str = "Try: --path src/";

/// Main error type for Serena client operations
///
/// The first three variants form the client's failure taxonomy: transport
/// reachability, session negotiation, and remote tool execution. The rest
/// cover the connector, argument shaping and the ambient layers.
#[derive(Error, Debug)]
pub enum SerenaError {
    /// Transport unreachable, request timed out, or non-success HTTP
    /// status during the handshake
    #[error("Connection error: {0}")]
    Connection(String),

    /// Handshake finished without a usable session id, the session
    /// expired remotely, or an operation ran without an active session
    #[error("Session error: {0}")]
    Session(String),

    /// Remote tool execution failed
    #[error("{message}")]
    Tool {
        /// Tool that was being called
        tool: String,
        /// Remote or local failure message
        message: String,
        /// JSON-RPC error code reported by the server
        code: Option<i64>,
        /// Auxiliary error data reported by the server
        data: Option<serde_json::Value>,
        /// Remediation hint shown to the user
        hint: Option<String>,
    },

    /// The connector's circuit breaker is rejecting calls
    #[error("Circuit breaker open for {0}")]
    CircuitOpen(String),

    /// An argument could not be mapped onto the wire format
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl SerenaError {
    /// Build a [`SerenaError::Tool`] with only a message.
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Tool {
            tool: tool.into(),
            message: message.into(),
            code: None,
            data: None,
            hint: None,
        }
    }

    /// The error raised when the server clipped an oversized answer.
    pub fn truncated(tool: impl Into<String>) -> Self {
        Self::Tool {
            tool: tool.into(),
            message: "Too many results - use --path to restrict search".to_string(),
            code: None,
            data: None,
            hint: Some(TRUNCATION_HINT.to_string()),
        }
    }

    /// Remediation hint carried by the error, if any.
    pub fn hint(&self) -> Option<&str> {
        match self {
            Self::Tool { hint, .. } => hint.as_deref(),
            _ => None,
        }
    }
}

/// Result type alias for Serena client operations
///
/// Uses `anyhow::Error` as the error type so call sites can attach context
/// with `?`; the underlying cause is a [`SerenaError`] wherever the failure
/// is part of the client's taxonomy.
pub type Result<T> = anyhow::Result<T>;

/// Returns the hint of a [`SerenaError`] wrapped in an `anyhow::Error`.
pub fn hint_of(err: &anyhow::Error) -> Option<&str> {
    err.downcast_ref::<SerenaError>().and_then(SerenaError::hint)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_error_display() {
        let error = SerenaError::Connection("refused".to_string());
        assert_eq!(error.to_string(), "Connection error: refused");
    }

    #[test]
    fn test_session_error_display() {
        let error = SerenaError::Session("no session id".to_string());
        assert_eq!(error.to_string(), "Session error: no session id");
    }

    #[test]
    fn test_tool_error_display_is_message() {
        let error = SerenaError::tool("find_symbol", "symbol not found");
        assert_eq!(error.to_string(), "symbol not found");
        assert!(error.hint().is_none());
    }

    #[test]
    fn test_truncated_carries_path_hint() {
        let error = SerenaError::truncated("find_symbol");
        assert!(error.to_string().contains("--path"));
        assert_eq!(error.hint(), Some(TRUNCATION_HINT));
        if let SerenaError::Tool { tool, .. } = &error {
            assert_eq!(tool, "find_symbol");
        } else {
            panic!("Expected Tool error");
        }
    }

    #[test]
    fn test_circuit_open_display() {
        let error = SerenaError::CircuitOpen("serena".to_string());
        assert_eq!(error.to_string(), "Circuit breaker open for serena");
    }

    #[test]
    fn test_hint_of_downcasts_through_anyhow() {
        let err: anyhow::Error = SerenaError::truncated("search_for_pattern").into();
        assert_eq!(hint_of(&err), Some(TRUNCATION_HINT));

        let plain = anyhow::anyhow!("something else");
        assert!(hint_of(&plain).is_none());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: SerenaError = io_error.into();
        assert!(matches!(error, SerenaError::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>("{invalid json}").unwrap_err();
        let error: SerenaError = json_error.into();
        assert!(matches!(error, SerenaError::Serialization(_)));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SerenaError>();
    }
}
