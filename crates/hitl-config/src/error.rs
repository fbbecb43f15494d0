//! Configuration error types.

/// Result type alias for config operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read a config file.
    #[error("failed to read config file '{path}': {source}")]
    ReadFile {
        path: String,
        source: std::io::Error,
    },

    /// Failed to parse TOML.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Failed to serialize config.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// An environment override could not be applied.
    #[error("invalid value for {var}: {message}")]
    Env { var: &'static str, message: String },

    /// Missing required field.
    #[error("missing required field '{field}' in {context}")]
    MissingField {
        field: &'static str,
        context: &'static str,
    },

    /// A field holds an unusable value.
    #[error("invalid value for '{field}': {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}
