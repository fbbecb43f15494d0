//! Server configuration.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default wall-clock budget for one tool call (90 seconds).
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

/// Default max body size for requests (1 MB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

/// Name reported in `initialize` results.
pub const DEFAULT_SERVER_NAME: &str = "hitl-mcp";

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server to.
    pub bind_address: SocketAddr,

    /// Hard budget for one `tools/call`, authentication included.
    pub request_timeout: Duration,

    /// Maximum request body size in bytes.
    /// Larger requests are rejected with 413. Default: 1 MB.
    pub max_body_size: usize,

    /// Enable request logging.
    pub request_logging: bool,

    /// CORS allowed origins (empty = no CORS).
    pub cors_origins: Vec<String>,

    /// Name reported to clients.
    pub server_name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            request_logging: true,
            cors_origins: Vec::new(),
            server_name: DEFAULT_SERVER_NAME.to_string(),
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bind address.
    pub fn with_bind_address(mut self, addr: SocketAddr) -> Self {
        self.bind_address = addr;
        self
    }

    /// Set the per-call timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the maximum request body size.
    pub fn with_max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }

    /// Enable or disable request logging.
    pub fn with_request_logging(mut self, enabled: bool) -> Self {
        self.request_logging = enabled;
        self
    }

    /// Set CORS allowed origins.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = origins;
        self
    }

    /// Set the name reported to clients.
    pub fn with_server_name(mut self, name: impl Into<String>) -> Self {
        self.server_name = name.into();
        self
    }
}
