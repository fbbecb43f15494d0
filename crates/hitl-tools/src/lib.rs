//! Tool contracts and dispatch for the HITL gateway.
//!
//! Each tool converts its raw JSON arguments into a typed parameter struct
//! (see [`params`]) before touching the HITL API, and every failure is folded
//! into [`ToolError`]. [`ToolRegistry::dispatch`] ties this to authentication
//! by resolving the caller's identity before a tool runs.

pub mod error;
pub mod params;
pub mod response;
pub mod tool;
pub mod tools;

pub use error::{ParamResult, ParameterValidationError, Result, ToolError};
pub use params::{
    AddFeedbackParams, CancelRequestParams, CreateRequestParams, DEFAULT_PLATFORM,
    ListLoopsParams, ListRequestsParams, ParamExt, RequestIdParams, UpdateRequestParams,
};
pub use response::{Content, ToolOutput};
pub use tool::{Invocation, Tool, ToolContext, ToolDescriptor, ToolRegistry};
pub use tools::{TOOL_NAMES, hitl_registry};
