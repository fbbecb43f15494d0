//! The HITL tools.
//!
//! - Loops: `list_loops`, `create_request`
//! - Requests: `list_requests`, `get_request`, `update_request`,
//!   `delete_request`, `cancel_request`
//! - Feedback: `add_request_feedback`

mod feedback;
mod loops;
mod requests;

use std::sync::Arc;

use hitl_client::LoopsApi;

use crate::tool::ToolRegistry;

pub use feedback::AddRequestFeedbackTool;
pub use loops::{CreateRequestTool, ListLoopsTool};
pub use requests::{
    CancelRequestTool, DeleteRequestTool, GetRequestTool, ListRequestsTool, UpdateRequestTool,
};

/// Names of every built-in tool.
pub const TOOL_NAMES: &[&str] = &[
    "list_loops",
    "create_request",
    "list_requests",
    "get_request",
    "update_request",
    "delete_request",
    "cancel_request",
    "add_request_feedback",
];

/// A registry with every HITL tool backed by `api`.
pub fn hitl_registry(api: Arc<dyn LoopsApi>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(ListLoopsTool::new(api.clone()));
    registry.register(CreateRequestTool::new(api.clone()));
    registry.register(ListRequestsTool::new(api.clone()));
    registry.register(GetRequestTool::new(api.clone()));
    registry.register(UpdateRequestTool::new(api.clone()));
    registry.register(DeleteRequestTool::new(api.clone()));
    registry.register(CancelRequestTool::new(api.clone()));
    registry.register(AddRequestFeedbackTool::new(api));
    registry
}

// ─────────────────────────────────────────────────────────────────────────────
// Test support
// ─────────────────────────────────────────────────────────────────────────────
