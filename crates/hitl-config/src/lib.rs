//! Configuration for the HITL gateway.
//!
//! A single TOML file (`hitl.toml`) with optional `[server]`, `[upstream]`,
//! `[auth]` and `[auth.jwt]` sections, layered under `HITL_*` environment
//! overrides. CLI flags are applied by the binary.

pub mod discovery;
pub mod env;
pub mod error;
pub mod types;

pub use discovery::{LoadedConfig, PROJECT_CONFIG_FILE, load_config, load_config_file, load_config_in};
pub use error::{ConfigError, Result};
pub use types::*;
