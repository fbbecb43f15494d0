//! Feedback on completed requests.

use std::sync::Arc;

use async_trait::async_trait;
use hitl_client::{FeedbackCategory, LoopsApi};
use serde_json::{Value, json};

use crate::error::Result;
use crate::params::{AddFeedbackParams, MAX_COMMENT_CHARS};
use crate::response::{ToolOutput, data_payload};
use crate::tool::{Tool, ToolContext};

/// Attaches feedback about the reviewer's response to a request.
pub struct AddRequestFeedbackTool {
    api: Arc<dyn LoopsApi>,
}

impl AddRequestFeedbackTool {
    pub fn new(api: Arc<dyn LoopsApi>) -> Self {
        Self { api }
    }
}

fn score_schema(description: &str) -> Value {
    json!({
        "type": "integer",
        "minimum": 1,
        "maximum": 5,
        "description": description
    })
}

#[async_trait]
impl Tool for AddRequestFeedbackTool {
    fn name(&self) -> &str {
        "add_request_feedback"
    }

    fn description(&self) -> &str {
        "Add feedback about how a request was handled. Any additional keys in `feedback` are stored as-is."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "request_id": {
                    "type": "string",
                    "description": "Id of the request"
                },
                "feedback": {
                    "type": "object",
                    "minProperties": 1,
                    "properties": {
                        "rating": score_schema("Overall rating"),
                        "comment": { "type": "string", "maxLength": MAX_COMMENT_CHARS },
                        "accuracy": score_schema("How accurate the response was"),
                        "timeliness": score_schema("How quickly the response arrived"),
                        "helpfulness": score_schema("How helpful the response was"),
                        "would_recommend": { "type": "boolean" },
                        "category": { "type": "string", "enum": FeedbackCategory::VALUES }
                    },
                    "additionalProperties": true
                }
            },
            "required": ["request_id", "feedback"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<ToolOutput> {
        let params = AddFeedbackParams::try_from(params)?;
        let response = self
            .api
            .add_request_feedback(ctx.credential(), &params.request_id, &params.feedback)
            .await?;
        ToolOutput::json(&data_payload(&response))
    }
}
