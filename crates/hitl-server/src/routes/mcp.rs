//! MCP endpoint.
//!
//! `POST /mcp` accepts one JSON-RPC message per request. Discovery methods
//! (`initialize`, `ping`, `tools/list`) are open; `tools/call` verifies the
//! bearer credential before anything else, binds the identity to the task,
//! and runs the tool under the configured wall-clock budget.

use axum::{
    Extension, Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use hitl_auth::context;
use hitl_tools::{Invocation, ParameterValidationError, ToolError, ToolOutput};
use serde_json::{Value, json};

use crate::error::RpcFailure;
use crate::logging::RpcMethod;
use crate::protocol::{
    CallToolParams, InitializeResult, JSONRPC_VERSION, JsonRpcError, JsonRpcRequest,
    JsonRpcResponse, ListToolsResult,
};
use crate::state::AppState;

/// Create MCP routes.
pub fn mcp_routes() -> Router<AppState> {
    Router::new().route("/mcp", post(mcp_handler))
}

/// Handle one JSON-RPC message.
pub async fn mcp_handler(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let request = match parse_request(&body) {
        Ok(request) => request,
        Err(failure) => return failure.into_response(),
    };

    let tag = RpcMethod(request.method.clone());
    let Some(id) = request.id.clone() else {
        tracing::debug!(method = %request.method, "Notification acknowledged");
        return (StatusCode::ACCEPTED, Extension(tag)).into_response();
    };

    let response = match handle_request(&state, &headers, request).await {
        Ok(result) => Json(JsonRpcResponse::success(id, result)).into_response(),
        Err(failure) => failure.into_response(),
    };
    (Extension(tag), response).into_response()
}

fn parse_request(body: &[u8]) -> Result<JsonRpcRequest, RpcFailure> {
    let value: Value = serde_json::from_slice(body).map_err(|e| {
        RpcFailure::protocol(
            Value::Null,
            JsonRpcError::PARSE_ERROR,
            format!("Parse error: {e}"),
        )
    })?;

    if value.is_array() {
        return Err(RpcFailure::protocol(
            Value::Null,
            JsonRpcError::INVALID_REQUEST,
            "Batch requests are not supported",
        ));
    }

    let id = value.get("id").cloned().unwrap_or(Value::Null);
    let request: JsonRpcRequest = serde_json::from_value(value).map_err(|e| {
        RpcFailure::protocol(
            id.clone(),
            JsonRpcError::INVALID_REQUEST,
            format!("Invalid request: {e}"),
        )
    })?;

    if request.jsonrpc != JSONRPC_VERSION {
        return Err(RpcFailure::protocol(
            id,
            JsonRpcError::INVALID_REQUEST,
            format!("Unsupported jsonrpc version '{}'", request.jsonrpc),
        ));
    }
    Ok(request)
}

async fn handle_request(
    state: &AppState,
    headers: &HeaderMap,
    request: JsonRpcRequest,
) -> Result<Value, RpcFailure> {
    let id = request.id.clone().unwrap_or(Value::Null);

    match request.method.as_str() {
        "initialize" => Ok(to_value(&InitializeResult::new(&state.config.server_name))),
        "ping" => Ok(json!({})),
        "tools/list" => Ok(to_value(&ListToolsResult {
            tools: state.registry.descriptors(),
        })),
        "tools/call" => {
            let output = call_tool(state, headers, request.params)
                .await
                .map_err(|e| RpcFailure::tool(id, &e))?;
            Ok(to_value(&output))
        }
        other => Err(RpcFailure::protocol(
            id,
            JsonRpcError::METHOD_NOT_FOUND,
            format!("Method not found: {other}"),
        )),
    }
}

/// Authenticate, bind the identity, then dispatch.
async fn call_tool(
    state: &AppState,
    headers: &HeaderMap,
    params: Option<Value>,
) -> Result<ToolOutput, ToolError> {
    let budget = state.config.request_timeout;
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let work = async {
        let identity = state
            .authenticator
            .authenticate_header(authorization)
            .await?;

        let CallToolParams { name, arguments } = parse_call_params(params)?;
        let invocation = Invocation::new(name, arguments.unwrap_or(Value::Null))
            .with_authorization(authorization);

        context::scope(
            identity,
            state.registry.dispatch(invocation, &state.authenticator),
        )
        .await
    };

    tokio::time::timeout(budget, work).await.map_err(|_| {
        ToolError::Transport(format!("request timed out after {}s", budget.as_secs()))
    })?
}

fn parse_call_params(params: Option<Value>) -> Result<CallToolParams, ToolError> {
    let params = params.unwrap_or(Value::Null);
    match params.get("name") {
        None | Some(Value::Null) => {
            return Err(ParameterValidationError::missing(
                "name",
                "tools/call requires the tool name",
            )
            .into());
        }
        Some(Value::String(_)) => {}
        Some(other) => {
            return Err(ParameterValidationError::invalid_type(
                "name",
                "string",
                hitl_tools::params::json_type(other),
            )
            .into());
        }
    }
    serde_json::from_value(params).map_err(|e| {
        ParameterValidationError::invalid_value("params", "tools/call", e.to_string()).into()
    })
}

fn to_value<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}
