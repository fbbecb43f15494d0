//! Application state shared across handlers.

use std::sync::Arc;

use hitl_auth::Authenticator;
use hitl_tools::ToolRegistry;

use crate::config::ServerConfig;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Tools exposed to clients.
    pub registry: Arc<ToolRegistry>,

    /// Bearer credential verification.
    pub authenticator: Authenticator,

    /// Server configuration.
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(registry: ToolRegistry, authenticator: Authenticator, config: ServerConfig) -> Self {
        Self {
            registry: Arc::new(registry),
            authenticator,
            config: Arc::new(config),
        }
    }
}
