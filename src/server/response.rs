//! JSON envelopes and error mapping for proxy routes
//!
//! Successes are `{"success": true, "data": ...}`; failures are
//! `{"success": false, "error": ..., "hint"?: ...}` with a status derived
//! from the [`SerenaError`] variant.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::{hint_of, SerenaError};

/// Wrap `data` in the success envelope.
pub fn success<T: Serialize>(data: T) -> Json<Value> {
    Json(json!({"success": true, "data": data}))
}

/// A failed route, rendered as the error envelope.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub hint: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// 503 for a connector that cannot serve requests.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }
}

/// Status code for a failure: bad input 400, remote tool failure 502,
/// connectivity 503, anything else 500.
pub fn status_for(err: &anyhow::Error) -> StatusCode {
    match err.downcast_ref::<SerenaError>() {
        Some(SerenaError::InvalidArgument(_)) => StatusCode::BAD_REQUEST,
        Some(SerenaError::Tool { .. }) => StatusCode::BAD_GATEWAY,
        Some(
            SerenaError::Connection(_) | SerenaError::Session(_) | SerenaError::CircuitOpen(_),
        ) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self {
            status: status_for(&err),
            message: err.to_string(),
            hint: hint_of(&err).map(str::to_string),
        }
    }
}

impl From<SerenaError> for ApiError {
    fn from(err: SerenaError) -> Self {
        anyhow::Error::from(err).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::warn!(status = %self.status, "request failed: {}", self.message);
        }
        let mut body = json!({"success": false, "error": self.message});
        if let Some(hint) = self.hint {
            body["hint"] = Value::String(hint);
        }
        (self.status, Json(body)).into_response()
    }
}

/// Result type for route handlers.
pub type ApiResult = std::result::Result<Json<Value>, ApiError>;
