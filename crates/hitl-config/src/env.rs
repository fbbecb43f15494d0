//! Environment variable overrides.
//!
//! Overrides apply after the file is loaded and before CLI flags. Empty
//! values are ignored.

use crate::error::{ConfigError, Result};
use crate::types::{AuthStrategy, HitlConfig};

pub const ENV_BIND_ADDRESS: &str = "HITL_BIND_ADDRESS";
pub const ENV_API_BASE_URL: &str = "HITL_API_BASE_URL";
pub const ENV_AUTH_STRATEGY: &str = "HITL_AUTH_STRATEGY";
pub const ENV_JWT_ISSUER: &str = "HITL_JWT_ISSUER";
pub const ENV_JWT_AUDIENCE: &str = "HITL_JWT_AUDIENCE";
pub const ENV_JWT_JWKS_URL: &str = "HITL_JWT_JWKS_URL";

impl HitlConfig {
    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_env_overrides_from(|var| std::env::var(var).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_env_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        if let Some(addr) = get(ENV_BIND_ADDRESS) {
            self.server.bind_address = addr;
        }
        if let Some(url) = get(ENV_API_BASE_URL) {
            self.upstream.base_url = url;
        }
        if let Some(strategy) = get(ENV_AUTH_STRATEGY) {
            self.auth.strategy =
                strategy
                    .parse::<AuthStrategy>()
                    .map_err(|message| ConfigError::Env {
                        var: ENV_AUTH_STRATEGY,
                        message,
                    })?;
        }
        if let Some(issuer) = get(ENV_JWT_ISSUER) {
            self.auth.jwt.issuer = Some(issuer);
        }
        if let Some(audience) = get(ENV_JWT_AUDIENCE) {
            self.auth.jwt.audience = Some(audience);
        }
        if let Some(url) = get(ENV_JWT_JWKS_URL) {
            self.auth.jwt.jwks_url = Some(url);
        }
        Ok(())
    }
}
