//! Error types for tool validation and dispatch.
//!
//! Every failure a tool call can hit is folded into [`ToolError`], which
//! carries a caller-facing message and, when one is known, an HTTP status.

use hitl_auth::AuthError;

// ─────────────────────────────────────────────────────────────────────────────
// Parameter Validation
// ─────────────────────────────────────────────────────────────────────────────

/// Error type for tool argument validation failures.
///
/// Messages name the offending field so the caller can fix the payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParameterValidationError {
    /// A required parameter is missing.
    #[error("missing required parameter '{name}': {hint}")]
    MissingRequired {
        /// The parameter name.
        name: &'static str,
        /// How to fix it.
        hint: &'static str,
    },

    /// A parameter has an invalid type.
    #[error("invalid type for '{name}': expected {expected}, got {actual}")]
    InvalidType {
        /// The parameter name.
        name: &'static str,
        /// The expected type.
        expected: &'static str,
        /// The actual JSON type found.
        actual: String,
    },

    /// A parameter value is out of range.
    #[error("'{name}' value {value} is out of range: {constraint}")]
    OutOfRange {
        /// The parameter name.
        name: &'static str,
        /// The actual value as string.
        value: String,
        /// Description of the valid range.
        constraint: String,
    },

    /// A parameter value doesn't match an allowed value or format.
    #[error("'{name}' has invalid value '{value}': {message}")]
    InvalidValue {
        /// The parameter name.
        name: &'static str,
        /// The invalid value.
        value: String,
        /// Why it's invalid.
        message: String,
    },

    /// Multiple validation errors.
    #[error("parameter validation failed: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ParameterValidationError>),
}

impl ParameterValidationError {
    /// Create a missing required parameter error.
    pub fn missing(name: &'static str, hint: &'static str) -> Self {
        Self::MissingRequired { name, hint }
    }

    /// Create an invalid type error.
    pub fn invalid_type(
        name: &'static str,
        expected: &'static str,
        actual: impl Into<String>,
    ) -> Self {
        Self::InvalidType {
            name,
            expected,
            actual: actual.into(),
        }
    }

    /// Create an out of range error.
    pub fn out_of_range(
        name: &'static str,
        value: impl ToString,
        constraint: impl Into<String>,
    ) -> Self {
        Self::OutOfRange {
            name,
            value: value.to_string(),
            constraint: constraint.into(),
        }
    }

    /// Create an invalid value error.
    pub fn invalid_value(
        name: &'static str,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            name,
            value: value.into(),
            message: message.into(),
        }
    }

    /// Collapse a list of errors; a single error is returned as-is.
    pub fn multiple(mut errors: Vec<ParameterValidationError>) -> Self {
        if errors.len() == 1 {
            errors.remove(0)
        } else {
            Self::Multiple(errors)
        }
    }

    /// Get the parameter name associated with this error (if single error).
    pub fn parameter_name(&self) -> Option<&str> {
        match self {
            Self::MissingRequired { name, .. } => Some(name),
            Self::InvalidType { name, .. } => Some(name),
            Self::OutOfRange { name, .. } => Some(name),
            Self::InvalidValue { name, .. } => Some(name),
            Self::Multiple(_) => None,
        }
    }

    /// Names of every parameter involved, in report order.
    pub fn parameter_names(&self) -> Vec<&str> {
        match self {
            Self::Multiple(errors) => errors.iter().flat_map(|e| e.parameter_names()).collect(),
            other => other.parameter_name().into_iter().collect(),
        }
    }
}

/// Result type for parameter validation.
pub type ParamResult<T> = std::result::Result<T, ParameterValidationError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tool Errors
// ─────────────────────────────────────────────────────────────────────────────

/// The single failure vocabulary returned for a tool call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ToolError {
    /// Missing, malformed, or rejected bearer credential.
    #[error("{message}")]
    Authentication {
        /// Caller-facing message.
        message: String,
    },

    /// Arguments violate the tool's contract.
    #[error("Invalid arguments: {0}")]
    Validation(ParameterValidationError),

    /// The HITL API answered with an error.
    #[error("{message}")]
    Upstream {
        /// HTTP status reported by the API.
        status: u16,
        /// Message from the API.
        message: String,
    },

    /// The HITL API could not be reached or did not answer in time.
    #[error("Request to HITL API failed: {0}")]
    Transport(String),

    /// No tool is registered under this name.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Anything else.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ToolError {
    /// Authentication failure with the standard message.
    pub fn authentication() -> Self {
        Self::Authentication {
            message: hitl_auth::AUTHENTICATION_REQUIRED.to_string(),
        }
    }

    /// Caller-facing message.
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// HTTP status, when one is known.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Authentication { .. } => Some(401),
            Self::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Short kind label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Authentication { .. } => "authentication",
            Self::Validation(_) => "validation",
            Self::Upstream { .. } => "upstream",
            Self::Transport(_) => "transport",
            Self::UnknownTool(_) => "unknown_tool",
            Self::Internal(_) => "internal",
        }
    }
}

impl From<ParameterValidationError> for ToolError {
    fn from(err: ParameterValidationError) -> Self {
        Self::Validation(err)
    }
}

impl From<AuthError> for ToolError {
    fn from(_: AuthError) -> Self {
        Self::authentication()
    }
}

impl From<hitl_client::Error> for ToolError {
    fn from(err: hitl_client::Error) -> Self {
        use hitl_client::Error;

        match err {
            Error::Api { status, message } => Self::Upstream { status, message },
            Error::Http(e) => match e.status() {
                Some(status) => Self::Upstream {
                    status: status.as_u16(),
                    message: e.to_string(),
                },
                None => Self::Transport(e.to_string()),
            },
            Error::Json(e) => Self::Transport(format!("malformed response from HITL API: {e}")),
            Error::InvalidUrl(e) => Self::Internal(e.to_string()),
            Error::Config(message) => Self::Internal(message),
        }
    }
}

/// Result type for tool execution.
pub type Result<T> = std::result::Result<T, ToolError>;
