//! Tool framework for the gateway.
//!
//! This module defines the [`Tool`] trait every HITL tool implements and the
//! [`ToolRegistry`] that dispatches named invocations to them.
//!
//! Dispatch order for one call is fixed. The caller's identity is resolved
//! first, then the tool name. The tool validates its arguments next, and
//! only then reaches the HITL API.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use hitl_auth::{Authenticator, IdentityRecord};
use serde_json::{Value, json};

use crate::error::{Result, ToolError};
use crate::response::ToolOutput;

// ─────────────────────────────────────────────────────────────────────────────
// Tool Trait
// ─────────────────────────────────────────────────────────────────────────────

/// A named, schema-described operation against the HITL API.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the unique name of this tool.
    fn name(&self) -> &str;

    /// Get a human-readable description of what this tool does.
    fn description(&self) -> &str;

    /// Get the JSON Schema for this tool's arguments.
    fn parameters(&self) -> Value;

    /// Execute the tool.
    ///
    /// Implementations must validate `params` completely before making any
    /// API call.
    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<ToolOutput>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Tool Context
// ─────────────────────────────────────────────────────────────────────────────

/// Context provided to tools during execution.
#[derive(Debug, Clone)]
pub struct ToolContext {
    identity: Arc<IdentityRecord>,
}

impl ToolContext {
    /// Context for a verified caller.
    pub fn new(identity: Arc<IdentityRecord>) -> Self {
        Self { identity }
    }

    /// The verified caller.
    pub fn identity(&self) -> &IdentityRecord {
        &self.identity
    }

    /// Credential to forward to the HITL API.
    pub fn credential(&self) -> &str {
        self.identity.credential()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Invocation
// ─────────────────────────────────────────────────────────────────────────────

/// A tool call as received from the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    /// Tool name.
    pub name: String,
    /// Raw arguments.
    pub arguments: Value,
    /// Raw `Authorization` header, if any.
    pub authorization: Option<String>,
}

impl Invocation {
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            name: name.into(),
            arguments,
            authorization: None,
        }
    }

    pub fn with_authorization(mut self, header: Option<impl Into<String>>) -> Self {
        self.authorization = header.map(Into::into);
        self
    }
}

/// Tool listing entry as exposed by `tools/list`.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tool Registry
// ─────────────────────────────────────────────────────────────────────────────

/// Registry and dispatcher for available tools.
///
/// Tools are kept ordered by name so listings are stable.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool.
    ///
    /// If a tool with the same name already exists, it will be replaced.
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.register_arc(Arc::new(tool));
    }

    /// Register a tool from an Arc.
    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Check if a tool exists.
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Get all tool names.
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    /// Get the number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Descriptors for every tool.
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools
            .values()
            .map(|tool| ToolDescriptor {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                input_schema: tool.parameters(),
            })
            .collect()
    }

    /// Run a tool for an already verified caller.
    pub async fn execute(
        &self,
        name: &str,
        params: Value,
        ctx: &ToolContext,
    ) -> Result<ToolOutput> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        tool.execute(params, ctx).await
    }

    /// Resolve the caller, then run the named tool.
    ///
    /// The identity comes from the request-scoped context when one is bound,
    /// otherwise the invocation's `Authorization` header is verified.
    pub async fn dispatch(
        &self,
        invocation: Invocation,
        authenticator: &Authenticator,
    ) -> Result<ToolOutput> {
        let Invocation {
            name,
            arguments,
            authorization,
        } = invocation;

        let identity = authenticator.resolve(authorization.as_deref()).await?;
        let tool = self
            .get(&name)
            .ok_or_else(|| ToolError::UnknownTool(name.clone()))?;
        let ctx = ToolContext::new(identity);

        let start = Instant::now();
        let result = tool.execute(arguments, &ctx).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match &result {
            Ok(_) => tracing::info!(
                tool = %name,
                subject = %ctx.identity().subject_id(),
                duration_ms,
                "Tool call succeeded"
            ),
            Err(e) => tracing::warn!(
                tool = %name,
                subject = %ctx.identity().subject_id(),
                duration_ms,
                kind = e.kind(),
                error = %e,
                "Tool call failed"
            ),
        }
        result
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

/// Schema for a tool that takes no arguments.
pub fn empty_schema() -> Value {
    json!({
        "type": "object",
        "properties": {},
        "additionalProperties": false
    })
}
