//! Configuration types.
//!
//! Every section and field is optional in the file; absent values take the
//! defaults below.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Default listen address.
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:3000";

/// Default wall-clock budget for one inbound call.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 90;

/// Default maximum request body size (1 MiB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

/// Default HITL API base URL.
pub const DEFAULT_API_BASE_URL: &str = "https://api.hitl.sh/v1";

/// Default timeout for calls to the HITL API.
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;

/// Default verification cache TTL.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Default verification cache capacity.
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

/// Default key set cache lifetime.
pub const DEFAULT_JWKS_TTL_SECS: u64 = 600;

/// Default clock skew tolerance for token expiry.
pub const DEFAULT_LEEWAY_SECS: u64 = 30;

/// Signing algorithms a token verifier can be configured with.
pub const KNOWN_ALGORITHMS: &[&str] = &[
    "HS256", "HS384", "HS512", "RS256", "RS384", "RS512", "PS256", "PS384", "PS512", "ES256",
    "ES384", "EdDSA",
];

// ─────────────────────────────────────────────────────────────────────────────
// Root
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration (`hitl.toml`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HitlConfig {
    /// HTTP listener.
    pub server: ServerConfig,
    /// HITL API.
    pub upstream: UpstreamConfig,
    /// Caller authentication.
    pub auth: AuthConfig,
}

impl HitlConfig {
    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        self.server.validate()?;
        self.upstream.validate()?;
        self.auth.validate()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Server
// ─────────────────────────────────────────────────────────────────────────────

/// `[server]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to listen on.
    pub bind_address: String,
    /// Wall-clock budget per call, in seconds.
    pub request_timeout_secs: u64,
    /// Maximum request body size in bytes.
    pub max_body_size: usize,
    /// Log every HTTP request.
    pub request_logging: bool,
    /// Allowed CORS origins; empty disables CORS.
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            request_logging: true,
            cors_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Parsed listen address.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.bind_address
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                field: "server.bind_address",
                message: format!("'{}': {e}", self.bind_address),
            })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    fn validate(&self) -> Result<()> {
        self.socket_addr()?;
        non_zero("server.request_timeout_secs", self.request_timeout_secs)?;
        if self.max_body_size == 0 {
            return Err(ConfigError::Invalid {
                field: "server.max_body_size",
                message: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Upstream
// ─────────────────────────────────────────────────────────────────────────────

/// `[upstream]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// HITL API base URL.
    pub base_url: String,
    /// Per-call timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: DEFAULT_UPSTREAM_TIMEOUT_SECS,
        }
    }
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn validate(&self) -> Result<()> {
        http_url("upstream.base_url", &self.base_url)?;
        non_zero("upstream.timeout_secs", self.timeout_secs)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Auth
// ─────────────────────────────────────────────────────────────────────────────

/// Which credential verifier the deployment uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthStrategy {
    /// Opaque HITL API keys, checked against the API.
    #[default]
    ApiKey,
    /// Signed tokens from a third-party issuer.
    Jwt,
}

impl AuthStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ApiKey => "api_key",
            Self::Jwt => "jwt",
        }
    }
}

impl std::fmt::Display for AuthStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "api_key" | "api-key" | "apikey" => Ok(Self::ApiKey),
            "jwt" => Ok(Self::Jwt),
            other => Err(format!(
                "unknown auth strategy '{other}' (expected api_key or jwt)"
            )),
        }
    }
}

/// `[auth]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Verifier to use.
    pub strategy: AuthStrategy,
    /// How long a verified credential is trusted, in seconds.
    pub cache_ttl_secs: u64,
    /// Maximum number of cached credentials.
    pub cache_capacity: usize,
    /// Settings for the `jwt` strategy.
    pub jwt: JwtConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            strategy: AuthStrategy::default(),
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            jwt: JwtConfig::default(),
        }
    }
}

impl AuthConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    fn validate(&self) -> Result<()> {
        non_zero("auth.cache_ttl_secs", self.cache_ttl_secs)?;
        if self.cache_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "auth.cache_capacity",
                message: "must be greater than 0".to_string(),
            });
        }
        if self.strategy == AuthStrategy::Jwt {
            self.jwt.validate()?;
        }
        Ok(())
    }
}

/// `[auth.jwt]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JwtConfig {
    /// Expected `iss` claim.
    pub issuer: Option<String>,
    /// Expected `aud` claim.
    pub audience: Option<String>,
    /// Key set location; defaults to `<issuer>/.well-known/jwks.json`.
    pub jwks_url: Option<String>,
    /// Key set cache lifetime in seconds.
    pub jwks_ttl_secs: u64,
    /// Accepted signing algorithms.
    pub algorithms: Vec<String>,
    /// Clock skew tolerance in seconds.
    pub leeway_secs: u64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            issuer: None,
            audience: None,
            jwks_url: None,
            jwks_ttl_secs: DEFAULT_JWKS_TTL_SECS,
            algorithms: vec!["RS256".to_string()],
            leeway_secs: DEFAULT_LEEWAY_SECS,
        }
    }
}

impl JwtConfig {
    /// Key set URL, explicit or derived from the issuer.
    pub fn resolved_jwks_url(&self) -> Option<String> {
        self.jwks_url.clone().or_else(|| {
            self.issuer
                .as_deref()
                .map(|iss| format!("{}/.well-known/jwks.json", iss.trim_end_matches('/')))
        })
    }

    pub fn jwks_ttl(&self) -> Duration {
        Duration::from_secs(self.jwks_ttl_secs)
    }

    fn validate(&self) -> Result<()> {
        let issuer = self
            .issuer
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::MissingField {
                field: "issuer",
                context: "[auth.jwt] (required when auth.strategy = \"jwt\")",
            })?;
        if self
            .audience
            .as_deref()
            .is_none_or(|s| s.trim().is_empty())
        {
            return Err(ConfigError::MissingField {
                field: "audience",
                context: "[auth.jwt] (required when auth.strategy = \"jwt\")",
            });
        }
        http_url("auth.jwt.issuer", issuer)?;
        if let Some(url) = &self.jwks_url {
            http_url("auth.jwt.jwks_url", url)?;
        }
        non_zero("auth.jwt.jwks_ttl_secs", self.jwks_ttl_secs)?;

        if self.algorithms.is_empty() {
            return Err(ConfigError::Invalid {
                field: "auth.jwt.algorithms",
                message: "at least one algorithm is required".to_string(),
            });
        }
        if let Some(unknown) = self
            .algorithms
            .iter()
            .find(|a| !KNOWN_ALGORITHMS.contains(&a.as_str()))
        {
            return Err(ConfigError::Invalid {
                field: "auth.jwt.algorithms",
                message: format!(
                    "unknown algorithm '{unknown}' (expected one of {})",
                    KNOWN_ALGORITHMS.join(", ")
                ),
            });
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn non_zero(field: &'static str, value: u64) -> Result<()> {
    if value == 0 {
        return Err(ConfigError::Invalid {
            field,
            message: "must be greater than 0".to_string(),
        });
    }
    Ok(())
}

fn http_url(field: &'static str, value: &str) -> Result<()> {
    let url = url::Url::parse(value).map_err(|e| ConfigError::Invalid {
        field,
        message: format!("'{value}': {e}"),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Invalid {
            field,
            message: format!("'{value}' must be an http or https URL"),
        });
    }
    Ok(())
}
