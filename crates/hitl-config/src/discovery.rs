//! Config file discovery.
//!
//! Resolution order (later overrides earlier):
//! 1. Built-in defaults
//! 2. `--config <path>` if given, otherwise `./hitl.toml` when present
//! 3. `HITL_*` environment variables
//! 4. CLI arguments (handled externally)

use std::path::{Path, PathBuf};

use crate::{ConfigError, HitlConfig, Result};

/// Default config filename in the working directory.
pub const PROJECT_CONFIG_FILE: &str = "hitl.toml";

/// Result of config discovery and loading.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// The resolved configuration.
    pub config: HitlConfig,
    /// File the configuration was read from, if any.
    pub source: Option<PathBuf>,
}

/// Load configuration from an explicit path or the working directory, then
/// apply environment overrides.
///
/// An explicit path must exist; the implicit `./hitl.toml` is optional.
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    load_config_in(explicit, Path::new("."))
}

/// Like [`load_config`], looking for the implicit file under `dir`.
pub fn load_config_in(explicit: Option<&Path>, dir: &Path) -> Result<LoadedConfig> {
    let (mut config, source) = match explicit {
        Some(path) => (load_config_file(path)?, Some(path.to_path_buf())),
        None => {
            let path = dir.join(PROJECT_CONFIG_FILE);
            if path.is_file() {
                (load_config_file(&path)?, Some(path))
            } else {
                (HitlConfig::default(), None)
            }
        }
    };

    config.apply_env_overrides()?;

    Ok(LoadedConfig { config, source })
}

/// Load config from a specific file path (no discovery, no overrides).
pub fn load_config_file(path: &Path) -> Result<HitlConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.display().to_string(),
        source: e,
    })?;
    HitlConfig::from_toml(&contents)
}
