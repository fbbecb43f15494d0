//! Request tools: list, get, update, delete, cancel.

use std::sync::Arc;

use async_trait::async_trait;
use hitl_client::{LoopsApi, Priority, RequestStatus, SortOrder};
use serde_json::{Value, json};

use super::loops::request_properties;
use crate::error::Result;
use crate::params::{
    CancelRequestParams, ListRequestsParams, MAX_LIST_LIMIT, MAX_REASON_CHARS, RequestIdParams,
    UpdateRequestParams,
};
use crate::response::{ToolOutput, data_payload, requests_payload};
use crate::tool::{Tool, ToolContext};

fn request_id_schema() -> Value {
    json!({
        "type": "string",
        "description": "Id of the request"
    })
}

/// Declares a tool struct holding the API handle.
macro_rules! api_tool {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        pub struct $name {
            api: Arc<dyn LoopsApi>,
        }

        impl $name {
            pub fn new(api: Arc<dyn LoopsApi>) -> Self {
                Self { api }
            }
        }
    };
}

api_tool! {
    /// Lists requests with optional filters and paging.
    ListRequestsTool
}

api_tool! {
    /// Fetches one request, including its response when completed.
    GetRequestTool
}

api_tool! {
    /// Changes fields of a pending request.
    UpdateRequestTool
}

api_tool! {
    /// Deletes a request.
    DeleteRequestTool
}

api_tool! {
    /// Cancels a pending request.
    CancelRequestTool
}

// ─────────────────────────────────────────────────────────────────────────────
// list_requests
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl Tool for ListRequestsTool {
    fn name(&self) -> &str {
        "list_requests"
    }

    fn description(&self) -> &str {
        "List your requests, optionally filtered by status, priority, or loop, with paging and sort order."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "status": { "type": "string", "enum": RequestStatus::VALUES },
                "priority": { "type": "string", "enum": Priority::VALUES },
                "loop_id": { "type": "string", "description": "Only requests in this loop" },
                "limit": { "type": "integer", "minimum": 1, "maximum": MAX_LIST_LIMIT },
                "offset": { "type": "integer", "minimum": 0 },
                "sort": { "type": "string", "enum": SortOrder::VALUES }
            }
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<ToolOutput> {
        let params = ListRequestsParams::try_from(params)?;
        let response = self
            .api
            .list_requests(ctx.credential(), &params.query)
            .await?;
        ToolOutput::json(&requests_payload(&response)?)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// get_request / delete_request
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl Tool for GetRequestTool {
    fn name(&self) -> &str {
        "get_request"
    }

    fn description(&self) -> &str {
        "Get a request by id, including its status and the reviewer's response once completed."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "request_id": request_id_schema() },
            "required": ["request_id"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<ToolOutput> {
        let params = RequestIdParams::try_from(params)?;
        let response = self
            .api
            .get_request(ctx.credential(), &params.request_id)
            .await?;
        ToolOutput::json(&data_payload(&response))
    }
}

#[async_trait]
impl Tool for DeleteRequestTool {
    fn name(&self) -> &str {
        "delete_request"
    }

    fn description(&self) -> &str {
        "Permanently delete a request."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "request_id": request_id_schema() },
            "required": ["request_id"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<ToolOutput> {
        let params = RequestIdParams::try_from(params)?;
        let response = self
            .api
            .delete_request(ctx.credential(), &params.request_id)
            .await?;
        ToolOutput::json(&data_payload(&response))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// update_request
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl Tool for UpdateRequestTool {
    fn name(&self) -> &str {
        "update_request"
    }

    fn description(&self) -> &str {
        "Update a pending request. Provide only the fields to change in `updates`."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "request_id": request_id_schema(),
                "updates": {
                    "type": "object",
                    "properties": request_properties(),
                    "minProperties": 1,
                    "description": "Fields to change; at least one is required"
                }
            },
            "required": ["request_id", "updates"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<ToolOutput> {
        let params = UpdateRequestParams::try_from(params)?;
        let response = self
            .api
            .update_request(ctx.credential(), &params.request_id, &params.updates)
            .await?;
        ToolOutput::json(&data_payload(&response))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// cancel_request
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl Tool for CancelRequestTool {
    fn name(&self) -> &str {
        "cancel_request"
    }

    fn description(&self) -> &str {
        "Cancel a pending request so reviewers no longer see it."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "request_id": request_id_schema(),
                "reason": {
                    "type": "string",
                    "minLength": 1,
                    "maxLength": MAX_REASON_CHARS,
                    "description": "Why the request is cancelled"
                }
            },
            "required": ["request_id"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<ToolOutput> {
        let params = CancelRequestParams::try_from(params)?;
        let response = self
            .api
            .cancel_request(ctx.credential(), &params.request_id, &params.body)
            .await?;
        ToolOutput::json(&data_payload(&response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToolError;
    use crate::tools::fake::{FakeApi, ctx};
    use hitl_client::ApiResponse;

    #[tokio::test]
    async fn test_list_requests_passes_query() {
        let api = FakeApi::new();
        api.respond(
            "list_requests",
            ApiResponse::ok(
                "ok",
                json!({
                    "requests": [{"id": "req_1"}],
                    "pagination": {"total": 1}
                }),
            ),
        );
        let tool = ListRequestsTool::new(api.clone());

        let output = tool
            .execute(json!({"status": "pending", "limit": 5}), &ctx())
            .await
            .unwrap();

        let payload = output.payload().unwrap();
        assert_eq!(payload["count"], 1);
        assert_eq!(payload["pagination"]["total"], 1);
        assert_eq!(
            api.calls()[0].body,
            json!({"status": "pending", "limit": 5})
        );
    }

    #[tokio::test]
    async fn test_get_request_targets_id() {
        let api = FakeApi::new();
        api.respond(
            "get_request",
            ApiResponse::ok("Request retrieved", json!({"id": "req_9", "status": "completed"})),
        );
        let tool = GetRequestTool::new(api.clone());

        let output = tool
            .execute(json!({"request_id": "req_9"}), &ctx())
            .await
            .unwrap();

        let payload = output.payload().unwrap();
        assert_eq!(payload["status"], "completed");
        assert_eq!(payload["message"], "Request retrieved");
        assert_eq!(api.calls()[0].target.as_deref(), Some("req_9"));
    }

    #[tokio::test]
    async fn test_get_request_not_found() {
        let api = FakeApi::new();
        api.fail("get_request", 404, "Request not found");
        let tool = GetRequestTool::new(api);

        let err = tool
            .execute(json!({"request_id": "req_missing"}), &ctx())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ToolError::Upstream {
                status: 404,
                message: "Request not found".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_update_request_empty_updates_rejected() {
        let api = FakeApi::new();
        let tool = UpdateRequestTool::new(api.clone());

        let err = tool
            .execute(json!({"request_id": "req_1", "updates": {}}), &ctx())
            .await
            .unwrap_err();

        assert!(err.message().contains("provide at least one field"));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_update_request_sends_only_changed_fields() {
        let api = FakeApi::new();
        let tool = UpdateRequestTool::new(api.clone());

        tool.execute(
            json!({"request_id": "req_1", "updates": {"priority": "critical"}}),
            &ctx(),
        )
        .await
        .unwrap();

        assert_eq!(api.calls()[0].body, json!({"priority": "critical"}));
    }

    #[tokio::test]
    async fn test_delete_request() {
        let api = FakeApi::new();
        api.respond(
            "delete_request",
            ApiResponse {
                error: false,
                msg: "Request deleted".to_string(),
                data: None,
            },
        );
        let tool = DeleteRequestTool::new(api.clone());

        let output = tool
            .execute(json!({"request_id": "req_1"}), &ctx())
            .await
            .unwrap();
        assert_eq!(
            output.payload().unwrap(),
            json!({"message": "Request deleted"})
        );
        assert_eq!(api.calls()[0].method, "delete_request");
    }

    #[tokio::test]
    async fn test_cancel_twice_is_validated_identically() {
        let api = FakeApi::new();
        let tool = CancelRequestTool::new(api.clone());
        let args = json!({"request_id": "req_1", "reason": "duplicate"});

        tool.execute(args.clone(), &ctx()).await.unwrap();
        tool.execute(args, &ctx()).await.unwrap();

        let calls = api.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], calls[1]);
        assert_eq!(calls[0].body, json!({"reason": "duplicate"}));
    }

    #[tokio::test]
    async fn test_cancel_without_reason_sends_empty_body() {
        let api = FakeApi::new();
        let tool = CancelRequestTool::new(api.clone());

        tool.execute(json!({"request_id": "req_1"}), &ctx())
            .await
            .unwrap();
        assert_eq!(api.calls()[0].body, json!({}));
    }
}
