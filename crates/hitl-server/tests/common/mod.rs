//! Shared fixtures for server integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use hitl_auth::{ApiKeyVerifier, Authenticator, CachedVerifier, TtlCache, context};
use hitl_client::{
    ApiResponse, CancelRequest, CreateRequest, Error, Feedback, ListRequestsQuery, LoopsApi,
    RequestUpdate, Result,
};
use hitl_server::{Server, ServerConfig};
use hitl_tools::{Tool, ToolContext, ToolOutput, ToolRegistry, hitl_registry};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tower::ServiceExt;

pub const GOOD_KEY: &str = "hitl_live_abc";
pub const OTHER_KEY: &str = "hitl_live_xyz";

// ─────────────────────────────────────────────────────────────────────────────
// Fake HITL API
// ─────────────────────────────────────────────────────────────────────────────

/// One recorded API call.
#[derive(Debug, Clone)]
pub struct Call {
    pub method: &'static str,
    pub api_key: String,
    pub target: Option<String>,
    pub body: Value,
}

/// In-memory HITL API.
///
/// `test_key` accepts the keys registered with [`FakeApi::with_key`]; other
/// methods return scripted responses, `{}` by default.
#[derive(Default)]
pub struct FakeApi {
    keys: Mutex<HashMap<String, String>>,
    calls: Mutex<Vec<Call>>,
    scripted: Mutex<HashMap<&'static str, std::result::Result<ApiResponse, (u16, String)>>>,
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        let api = Self::default();
        api.keys
            .lock()
            .insert(GOOD_KEY.to_string(), "usr_1".to_string());
        api.keys
            .lock()
            .insert(OTHER_KEY.to_string(), "usr_2".to_string());
        Arc::new(api)
    }

    pub fn respond(&self, method: &'static str, response: ApiResponse) {
        self.scripted.lock().insert(method, Ok(response));
    }

    pub fn fail(&self, method: &'static str, status: u16, message: &str) {
        self.scripted
            .lock()
            .insert(method, Err((status, message.to_string())));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn calls_to(&self, method: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.method == method)
            .collect()
    }

    fn record(
        &self,
        method: &'static str,
        api_key: &str,
        target: Option<&str>,
        body: Value,
    ) -> Result<ApiResponse> {
        self.calls.lock().push(Call {
            method,
            api_key: api_key.to_string(),
            target: target.map(str::to_string),
            body,
        });
        match self.scripted.lock().get(method).cloned() {
            Some(Ok(response)) => Ok(response),
            Some(Err((status, message))) => Err(Error::api(status, message)),
            None => Ok(ApiResponse::ok("ok", json!({}))),
        }
    }
}

fn to_value<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

#[async_trait]
impl LoopsApi for FakeApi {
    async fn test_key(&self, api_key: &str) -> Result<ApiResponse> {
        self.calls.lock().push(Call {
            method: "test_key",
            api_key: api_key.to_string(),
            target: None,
            body: Value::Null,
        });
        let user = self.keys.lock().get(api_key).cloned();
        match user {
            Some(user_id) => Ok(ApiResponse::ok(
                "API key is valid",
                json!({
                    "user_id": user_id,
                    "email": format!("{user_id}@example.com"),
                    "api_key_id": format!("key_{user_id}"),
                    "account_status": "active",
                    "permissions": ["loops:read", "requests:write"]
                }),
            )),
            None => Err(Error::api(401, "Invalid API key")),
        }
    }

    async fn get_loops(&self, api_key: &str) -> Result<ApiResponse> {
        self.record("get_loops", api_key, None, Value::Null)
    }

    async fn create_request(
        &self,
        api_key: &str,
        loop_id: &str,
        request: &CreateRequest,
    ) -> Result<ApiResponse> {
        self.record("create_request", api_key, Some(loop_id), to_value(request))
    }

    async fn list_requests(&self, api_key: &str, query: &ListRequestsQuery) -> Result<ApiResponse> {
        self.record("list_requests", api_key, None, to_value(query))
    }

    async fn get_request(&self, api_key: &str, request_id: &str) -> Result<ApiResponse> {
        self.record("get_request", api_key, Some(request_id), Value::Null)
    }

    async fn update_request(
        &self,
        api_key: &str,
        request_id: &str,
        update: &RequestUpdate,
    ) -> Result<ApiResponse> {
        self.record("update_request", api_key, Some(request_id), to_value(update))
    }

    async fn delete_request(&self, api_key: &str, request_id: &str) -> Result<ApiResponse> {
        self.record("delete_request", api_key, Some(request_id), Value::Null)
    }

    async fn cancel_request(
        &self,
        api_key: &str,
        request_id: &str,
        body: &CancelRequest,
    ) -> Result<ApiResponse> {
        self.record("cancel_request", api_key, Some(request_id), to_value(body))
    }

    async fn add_request_feedback(
        &self,
        api_key: &str,
        request_id: &str,
        feedback: &Feedback,
    ) -> Result<ApiResponse> {
        self.record(
            "add_request_feedback",
            api_key,
            Some(request_id),
            to_value(feedback),
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Extra tools
// ─────────────────────────────────────────────────────────────────────────────

/// Sleeps, then reports the caller bound to the task.
pub struct WhoAmITool {
    pub delay: Duration,
}

#[async_trait]
impl Tool for WhoAmITool {
    fn name(&self) -> &str {
        "whoami"
    }

    fn description(&self) -> &str {
        "Report the calling subject"
    }

    fn parameters(&self) -> Value {
        hitl_tools::tool::empty_schema()
    }

    async fn execute(&self, _params: Value, ctx: &ToolContext) -> hitl_tools::Result<ToolOutput> {
        tokio::time::sleep(self.delay).await;
        let bound = context::current().map(|i| i.subject_id().to_string());
        ToolOutput::json(&json!({
            "subject": ctx.identity().subject_id(),
            "bound": bound,
        }))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Harness
// ─────────────────────────────────────────────────────────────────────────────

pub struct TestApp {
    pub api: Arc<FakeApi>,
    pub router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(ServerConfig::new().with_request_logging(false))
    }

    pub fn with_config(config: ServerConfig) -> Self {
        Self::build(config, |_| {})
    }

    pub fn build(config: ServerConfig, extend: impl FnOnce(&mut ToolRegistry)) -> Self {
        let api = FakeApi::new();
        let mut registry = hitl_registry(api.clone());
        extend(&mut registry);

        let verifier = ApiKeyVerifier::new(api.clone());
        let authenticator = Authenticator::new(CachedVerifier::new(
            Arc::new(verifier),
            Arc::new(TtlCache::new(64)),
        ));

        let router = Server::new(registry, authenticator, config).router();
        Self { api, router }
    }

    /// POST a JSON-RPC body to `/mcp`.
    pub async fn rpc(&self, body: Value, bearer: Option<&str>) -> (StatusCode, Option<String>, Value) {
        self.rpc_raw(body.to_string(), bearer.map(|k| format!("Bearer {k}")))
            .await
    }

    pub async fn rpc_raw(
        &self,
        body: String,
        authorization: Option<String>,
    ) -> (StatusCode, Option<String>, Value) {
        let mut request = Request::builder()
            .method("POST")
            .uri("/mcp")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(value) = authorization {
            request = request.header(header::AUTHORIZATION, value);
        }

        let response = self
            .router
            .clone()
            .oneshot(request.body(Body::from(body)).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let challenge = response
            .headers()
            .get(header::WWW_AUTHENTICATE)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, challenge, json)
    }

    /// `tools/call` with the given bearer key.
    pub async fn call(&self, name: &str, arguments: Value, bearer: Option<&str>) -> (StatusCode, Value) {
        let (status, _, body) = self
            .rpc(
                json!({
                    "jsonrpc": "2.0",
                    "id": 1,
                    "method": "tools/call",
                    "params": {"name": name, "arguments": arguments}
                }),
                bearer,
            )
            .await;
        (status, body)
    }
}

/// Parse the JSON text block of a successful `tools/call` result.
pub fn payload(body: &Value) -> Value {
    let content = body["result"]["content"]
        .as_array()
        .expect("result has content");
    assert_eq!(content.len(), 1, "exactly one content block");
    assert_eq!(content[0]["type"], "text");
    serde_json::from_str(content[0]["text"].as_str().unwrap()).unwrap()
}
