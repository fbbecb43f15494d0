//! End-to-end tests for the MCP endpoint.

mod common;

use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use hitl_client::ApiResponse;
use hitl_server::{BEARER_CHALLENGE, RpcMethod, ServerConfig};
use serde_json::{Value, json};
use tower::ServiceExt;

use common::{GOOD_KEY, OTHER_KEY, TestApp, WhoAmITool, payload};

// ─────────────────────────────────────────────────────────────────────────────
// Discovery
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_health_is_open() {
    let app = TestApp::new();
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_initialize_without_credentials() {
    let app = TestApp::new();
    let (status, _, body) = app
        .rpc(
            json!({"jsonrpc": "2.0", "id": "init-1", "method": "initialize", "params": {}}),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "init-1");
    assert_eq!(body["result"]["serverInfo"]["name"], "hitl-mcp");
    assert!(body["result"]["capabilities"]["tools"].is_object());
    assert!(app.api.calls().is_empty());
}

#[tokio::test]
async fn test_ping() {
    let app = TestApp::new();
    let (status, _, body) = app
        .rpc(json!({"jsonrpc": "2.0", "id": 2, "method": "ping"}), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], json!({}));
}

#[tokio::test]
async fn test_tools_list_advertises_every_tool() {
    let app = TestApp::new();
    let (status, _, body) = app
        .rpc(json!({"jsonrpc": "2.0", "id": 3, "method": "tools/list"}), None)
        .await;

    assert_eq!(status, StatusCode::OK);
    let tools = body["result"]["tools"].as_array().unwrap();
    let mut names: Vec<&str> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
    names.sort_unstable();
    let mut expected = hitl_tools::TOOL_NAMES.to_vec();
    expected.sort_unstable();
    assert_eq!(names, expected);

    for tool in tools {
        assert_eq!(tool["inputSchema"]["type"], "object", "{}", tool["name"]);
        assert!(tool["description"].as_str().is_some_and(|d| !d.is_empty()));
    }
}

#[tokio::test]
async fn test_notification_is_accepted_without_body() {
    let app = TestApp::new();
    let (status, _, body) = app
        .rpc(
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body, Value::Null);
}

#[tokio::test]
async fn test_null_id_is_answered() {
    let app = TestApp::new();
    let (status, _, body) = app
        .rpc(json!({"jsonrpc": "2.0", "id": null, "method": "ping"}), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], json!({}));
    assert!(body.as_object().unwrap().contains_key("id"));
    assert_eq!(body["id"], Value::Null);
}

#[tokio::test]
async fn test_response_tagged_with_rpc_method() {
    let app = TestApp::new();
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/mcp")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        response.extensions().get::<RpcMethod>(),
        Some(&RpcMethod("tools/list".to_string()))
    );
}

#[tokio::test]
async fn test_unknown_method() {
    let app = TestApp::new();
    let (status, _, body) = app
        .rpc(
            json!({"jsonrpc": "2.0", "id": 9, "method": "resources/list"}),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error"]["code"], -32601);
    assert_eq!(body["id"], 9);
}

#[tokio::test]
async fn test_malformed_json_is_parse_error() {
    let app = TestApp::new();
    let (status, _, body) = app.rpc_raw("{\"jsonrpc\":".to_string(), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], -32700);
    assert_eq!(body["id"], Value::Null);
}

#[tokio::test]
async fn test_oversized_body_rejected() {
    let app = TestApp::with_config(
        ServerConfig::new()
            .with_request_logging(false)
            .with_max_body_size(64),
    );
    let big = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "ping",
        "params": {"pad": "x".repeat(512)}
    });
    let (status, _, _) = app.rpc_raw(big.to_string(), None).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

// ─────────────────────────────────────────────────────────────────────────────
// Authentication
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_call_without_credentials_is_401() {
    let app = TestApp::new();
    let (status, challenge, body) = app
        .rpc(
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "tools/call",
                "params": {"name": "list_loops", "arguments": {}}
            }),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(challenge.as_deref(), Some(BEARER_CHALLENGE));
    assert_eq!(body["error"]["code"], -32001);
    assert!(
        body["error"]["message"]
            .as_str()
            .unwrap()
            .starts_with("Authentication is required")
    );
    assert!(body.get("result").is_none());
    assert!(app.api.calls().is_empty());
}

#[tokio::test]
async fn test_authentication_precedes_tool_lookup() {
    let app = TestApp::new();
    let (status, body) = app.call("no_such_tool", json!({}), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], -32001);
}

#[tokio::test]
async fn test_rejected_key_never_reaches_tool() {
    let app = TestApp::new();
    let (status, body) = app.call("list_loops", json!({}), Some("hitl_live_bogus")).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], -32001);
    assert_eq!(app.api.calls_to("test_key").len(), 1);
    assert!(app.api.calls_to("get_loops").is_empty());
}

#[tokio::test]
async fn test_non_bearer_scheme_rejected() {
    let app = TestApp::new();
    let request = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "tools/call",
        "params": {"name": "list_loops"}
    });
    let (status, _, body) = app
        .rpc_raw(request.to_string(), Some(format!("Basic {GOOD_KEY}")))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], -32001);
    assert!(app.api.calls().is_empty());
}

#[tokio::test]
async fn test_lowercase_bearer_scheme_accepted() {
    let app = TestApp::new();
    let request = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "tools/call",
        "params": {"name": "get_request", "arguments": {"request_id": "req_1"}}
    });
    let (status, _, body) = app
        .rpc_raw(request.to_string(), Some(format!("bearer {GOOD_KEY}")))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn test_verified_key_is_cached_across_calls() {
    let app = TestApp::new();
    for _ in 0..3 {
        let (status, _) = app
            .call("get_request", json!({"request_id": "req_1"}), Some(GOOD_KEY))
            .await;
        assert_eq!(status, StatusCode::OK);
    }
    assert_eq!(app.api.calls_to("test_key").len(), 1);
    assert_eq!(app.api.calls_to("get_request").len(), 3);
}

// ─────────────────────────────────────────────────────────────────────────────
// Tool calls
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_loops_returns_loops_and_count() {
    let app = TestApp::new();
    app.api.respond(
        "get_loops",
        ApiResponse::ok(
            "Loops retrieved",
            json!({"loops": [{"id": "loop_1", "name": "Review"}, {"id": "loop_2", "name": "QA"}]}),
        ),
    );

    let (status, body) = app.call("list_loops", json!({}), Some(GOOD_KEY)).await;

    assert_eq!(status, StatusCode::OK);
    let result = payload(&body);
    assert_eq!(result["loops"].as_array().unwrap().len(), 2);
    assert_eq!(result["count"], 2);

    let calls = app.api.calls_to("get_loops");
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].api_key, GOOD_KEY);
}

#[tokio::test]
async fn test_create_request_sends_exact_fields() {
    let app = TestApp::new();
    app.api.respond(
        "create_request",
        ApiResponse::ok("Request created", json!({"request_id": "req_9"})),
    );

    let (status, body) = app
        .call(
            "create_request",
            json!({
                "loop_id": "loop_1",
                "processing_type": "deferred",
                "type": "markdown",
                "priority": "high",
                "request_text": "Review this",
                "response_type": "single_select",
                "response_config": {"options": ["A", "B"]}
            }),
            Some(GOOD_KEY),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    let result = payload(&body);
    assert_eq!(result["request_id"], "req_9");
    assert_eq!(result["message"], "Request created");

    let calls = app.api.calls_to("create_request");
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].target.as_deref(), Some("loop_1"));
    assert_eq!(
        calls[0].body,
        json!({
            "processing_type": "deferred",
            "type": "markdown",
            "priority": "high",
            "request_text": "Review this",
            "response_type": "single_select",
            "response_config": {"options": ["A", "B"]},
            "platform": "api"
        })
    );
}

#[tokio::test]
async fn test_time_sensitive_without_timeout_fails_before_api() {
    let app = TestApp::new();
    let (status, body) = app
        .call(
            "create_request",
            json!({
                "loop_id": "loop_1",
                "processing_type": "time-sensitive",
                "type": "markdown",
                "priority": "high",
                "request_text": "Review this",
                "response_type": "text",
                "response_config": {}
            }),
            Some(GOOD_KEY),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error"]["code"], -32602);
    assert!(
        body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("timeout_seconds")
    );
    assert_eq!(body["error"]["data"]["fields"], json!(["timeout_seconds"]));
    assert!(app.api.calls_to("create_request").is_empty());
}

#[tokio::test]
async fn test_empty_update_rejected() {
    let app = TestApp::new();
    let (_, body) = app
        .call(
            "update_request",
            json!({"request_id": "req_1", "updates": {}}),
            Some(GOOD_KEY),
        )
        .await;
    assert_eq!(body["error"]["code"], -32602);
    assert!(
        body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("provide at least one field")
    );
    assert!(app.api.calls_to("update_request").is_empty());
}

#[tokio::test]
async fn test_upstream_error_forwarded_with_status() {
    let app = TestApp::new();
    app.api.fail("get_request", 404, "Request not found");

    let (status, body) = app
        .call("get_request", json!({"request_id": "missing"}), Some(GOOD_KEY))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error"]["code"], -32002);
    assert_eq!(body["error"]["message"], "Request not found");
    assert_eq!(body["error"]["data"]["status"], 404);
    assert!(body.get("result").is_none());
}

#[tokio::test]
async fn test_unknown_tool_with_valid_key() {
    let app = TestApp::new();
    let (status, body) = app.call("drop_tables", json!({}), Some(GOOD_KEY)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error"]["code"], -32601);
    assert!(
        body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("drop_tables")
    );
}

#[tokio::test]
async fn test_cancel_twice_is_handled_identically() {
    let app = TestApp::new();
    let args = json!({"request_id": "req_1", "reason": "no longer needed"});

    let (_, first) = app.call("cancel_request", args.clone(), Some(GOOD_KEY)).await;
    let (_, second) = app.call("cancel_request", args, Some(GOOD_KEY)).await;

    assert_eq!(first, second);
    let calls = app.api.calls_to("cancel_request");
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].body, calls[1].body);
    assert_eq!(calls[0].body, json!({"reason": "no longer needed"}));
}

// ─────────────────────────────────────────────────────────────────────────────
// Identity binding and time budget
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_concurrent_calls_see_their_own_identity() {
    let app = TestApp::build(ServerConfig::new().with_request_logging(false), |registry| {
        registry.register(WhoAmITool {
            delay: Duration::from_millis(20),
        });
    });

    let ((_, first), (_, second)) = tokio::join!(
        app.call("whoami", json!({}), Some(GOOD_KEY)),
        app.call("whoami", json!({}), Some(OTHER_KEY)),
    );

    let first = payload(&first);
    let second = payload(&second);
    assert_eq!(first["subject"], "usr_1");
    assert_eq!(first["bound"], "usr_1");
    assert_eq!(second["subject"], "usr_2");
    assert_eq!(second["bound"], "usr_2");
}

#[tokio::test(start_paused = true)]
async fn test_call_exceeding_budget_times_out() {
    let config = ServerConfig::new()
        .with_request_logging(false)
        .with_request_timeout(Duration::from_secs(1));
    let app = TestApp::build(config, |registry| {
        registry.register(WhoAmITool {
            delay: Duration::from_secs(5),
        });
    });

    let (status, body) = app.call("whoami", json!({}), Some(GOOD_KEY)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error"]["code"], -32003);
    assert!(
        body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("timed out")
    );
}
