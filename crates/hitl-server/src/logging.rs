//! Request logging middleware.
//!
//! One line per HTTP request. MCP requests also carry the JSON-RPC method
//! (tagged on the response by the handler) and the fingerprint of the bearer
//! credential, never the credential itself.

use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use hitl_auth::{fingerprint, parse_bearer_token};

use crate::state::AppState;

/// JSON-RPC method served by a response, set by the MCP handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcMethod(pub String);

/// Fingerprint of the bearer credential, if the header holds one.
pub fn caller_fingerprint(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok();
    parse_bearer_token(value).ok().map(fingerprint)
}

/// Logs method, path, RPC method, caller, status, and duration.
pub async fn request_logging_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !state.config.request_logging {
        return next.run(request).await;
    }

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let caller = caller_fingerprint(request.headers());
    let start = tokio::time::Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    let rpc = response
        .extensions()
        .get::<RpcMethod>()
        .map(|m| m.0.as_str())
        .unwrap_or("-");
    let caller = caller.as_deref().unwrap_or("-");
    let duration_ms = start.elapsed().as_millis() as u64;

    macro_rules! log_at {
        ($level:ident, $message:literal) => {
            tracing::$level!(
                method = %method,
                path = %path,
                rpc,
                caller,
                status = status.as_u16(),
                duration_ms,
                $message
            )
        };
    }

    if status.is_server_error() {
        log_at!(error, "Request failed");
    } else if status.is_client_error() {
        log_at!(warn, "Request rejected");
    } else {
        log_at!(info, "Request completed");
    }

    response
}
