//! Error types for the server.
//!
//! [`RpcFailure`] is the single failure shape written to clients. Tool errors
//! are mapped onto JSON-RPC codes here and nowhere else.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use hitl_tools::ToolError;
use serde_json::{Value, json};
use thiserror::Error;

use crate::protocol::{JsonRpcError, JsonRpcResponse};

/// Challenge sent with 401 responses.
pub const BEARER_CHALLENGE: &str = r#"Bearer realm="hitl-mcp""#;

/// Server lifecycle errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listener could not be bound.
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        source: std::io::Error,
    },

    /// The server stopped with an I/O error.
    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

// ─────────────────────────────────────────────────────────────────────────────
// JSON-RPC failures
// ─────────────────────────────────────────────────────────────────────────────

/// A JSON-RPC error response plus the HTTP status it travels with.
#[derive(Debug, Clone)]
pub struct RpcFailure {
    pub id: Value,
    pub error: JsonRpcError,
    pub status: StatusCode,
}

impl RpcFailure {
    /// Protocol-level failure (bad envelope, unknown method).
    pub fn protocol(id: Value, code: i64, message: impl Into<String>) -> Self {
        let status = match code {
            JsonRpcError::PARSE_ERROR | JsonRpcError::INVALID_REQUEST => StatusCode::BAD_REQUEST,
            _ => StatusCode::OK,
        };
        Self {
            id,
            error: JsonRpcError::new(code, message),
            status,
        }
    }

    /// Failure of a tool call.
    pub fn tool(id: Value, err: &ToolError) -> Self {
        let message = err.message();
        let (code, data, status) = match err {
            ToolError::UnknownTool(_) => (JsonRpcError::METHOD_NOT_FOUND, None, StatusCode::OK),
            ToolError::Validation(e) => (
                JsonRpcError::INVALID_PARAMS,
                Some(json!({ "fields": e.parameter_names() })),
                StatusCode::OK,
            ),
            ToolError::Authentication { .. } => (
                JsonRpcError::AUTHENTICATION_FAILED,
                None,
                StatusCode::UNAUTHORIZED,
            ),
            ToolError::Upstream { status, .. } => (
                JsonRpcError::UPSTREAM_ERROR,
                Some(json!({ "status": status })),
                StatusCode::OK,
            ),
            ToolError::Transport(_) => (JsonRpcError::TRANSPORT_ERROR, None, StatusCode::OK),
            ToolError::Internal(_) => (JsonRpcError::INTERNAL_ERROR, None, StatusCode::OK),
        };

        let mut error = JsonRpcError::new(code, message);
        error.data = data;
        Self { id, error, status }
    }

    /// JSON-RPC error code.
    pub fn code(&self) -> i64 {
        self.error.code
    }
}

impl IntoResponse for RpcFailure {
    fn into_response(self) -> Response {
        let code = self.error.code;
        let status = self.status;

        match code {
            JsonRpcError::INTERNAL_ERROR => {
                tracing::error!(status = %status.as_u16(), code, error = %self.error.message, "Server error");
            }
            _ => {
                tracing::debug!(status = %status.as_u16(), code, error = %self.error.message, "JSON-RPC error");
            }
        }

        let mut response =
            (status, Json(JsonRpcResponse::failure(self.id, self.error))).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static(BEARER_CHALLENGE),
            );
        }
        response
    }
}
