//! Loop tools: listing loops and posting requests into one.

use std::sync::Arc;

use async_trait::async_trait;
use hitl_client::{ContentType, LoopsApi, Priority, ProcessingType, ResponseType};
use serde_json::{Value, json};

use crate::error::Result;
use crate::params::{CreateRequestParams, ListLoopsParams, MAX_REQUEST_TEXT_CHARS};
use crate::response::{ToolOutput, data_payload, loops_payload};
use crate::tool::{Tool, ToolContext, empty_schema};

// ─────────────────────────────────────────────────────────────────────────────
// list_loops
// ─────────────────────────────────────────────────────────────────────────────

/// Lists the loops the caller belongs to.
pub struct ListLoopsTool {
    api: Arc<dyn LoopsApi>,
}

impl ListLoopsTool {
    pub fn new(api: Arc<dyn LoopsApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Tool for ListLoopsTool {
    fn name(&self) -> &str {
        "list_loops"
    }

    fn description(&self) -> &str {
        "List all loops you own or are a member of. Returns each loop with its id, name, and member count."
    }

    fn parameters(&self) -> Value {
        empty_schema()
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<ToolOutput> {
        let _ = ListLoopsParams::try_from(params)?;
        let response = self.api.get_loops(ctx.credential()).await?;
        ToolOutput::json(&loops_payload(&response)?)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// create_request
// ─────────────────────────────────────────────────────────────────────────────

/// JSON Schema for the request definition fields.
///
/// `required` marks what a new request needs; `update_request` reuses the
/// properties with nothing required.
pub(crate) fn request_properties() -> Value {
    json!({
        "processing_type": {
            "type": "string",
            "enum": ProcessingType::VALUES,
            "description": "time-sensitive requests expire after timeout_seconds; deferred requests wait indefinitely"
        },
        "type": {
            "type": "string",
            "enum": ContentType::VALUES,
            "description": "Content type shown to the reviewer"
        },
        "priority": {
            "type": "string",
            "enum": Priority::VALUES
        },
        "request_text": {
            "type": "string",
            "minLength": 1,
            "maxLength": MAX_REQUEST_TEXT_CHARS,
            "description": "Text shown to the reviewer"
        },
        "image_url": {
            "type": "string",
            "format": "uri",
            "description": "Image to review (required when type is image)"
        },
        "context": {
            "type": "object",
            "description": "Additional structured context for the reviewer"
        },
        "timeout_seconds": {
            "type": "integer",
            "minimum": 1,
            "description": "Seconds before the request times out (required when processing_type is time-sensitive)"
        },
        "response_type": {
            "type": "string",
            "enum": ResponseType::VALUES
        },
        "response_config": {
            "type": "object",
            "description": "Response configuration, e.g. {\"options\": [\"Approve\", \"Reject\"]} for single_select"
        },
        "default_response": {
            "description": "Response used if the request times out"
        },
        "callback_url": {
            "type": "string",
            "format": "uri",
            "description": "Webhook notified when the request completes"
        },
        "platform": {
            "type": "string",
            "description": "Originating platform (defaults to \"api\")"
        },
        "platform_version": {
            "type": "string"
        }
    })
}

/// Posts a new request into a loop for human review.
pub struct CreateRequestTool {
    api: Arc<dyn LoopsApi>,
}

impl CreateRequestTool {
    pub fn new(api: Arc<dyn LoopsApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Tool for CreateRequestTool {
    fn name(&self) -> &str {
        "create_request"
    }

    fn description(&self) -> &str {
        "Create a request for human review in a loop. Loop members are notified and one of them responds in the configured response format."
    }

    fn parameters(&self) -> Value {
        let mut properties = request_properties();
        properties["loop_id"] = json!({
            "type": "string",
            "description": "Loop to post the request to"
        });
        json!({
            "type": "object",
            "properties": properties,
            "required": [
                "loop_id",
                "processing_type",
                "type",
                "priority",
                "request_text",
                "response_type",
                "response_config"
            ]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<ToolOutput> {
        let (loop_id, payload) = CreateRequestParams::try_from(params)?.into_payload();
        let response = self
            .api
            .create_request(ctx.credential(), &loop_id, &payload)
            .await?;
        ToolOutput::json(&data_payload(&response))
    }
}
