//! Error types for authentication.

/// Message returned to callers whenever authentication does not succeed.
pub const AUTHENTICATION_REQUIRED: &str =
    "Authentication is required. Provide a valid API key via 'Authorization: Bearer <key>'.";

/// Why a credential did not verify.
///
/// Verifiers return this instead of raising; it exists for diagnostics only
/// and is never shown to callers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationFailure {
    /// The credential is not shaped like the strategy expects.
    #[error("malformed credential: {0}")]
    Malformed(String),

    /// The issuer of the credential rejected it.
    #[error("credential rejected: {0}")]
    Rejected(String),

    /// Signature, issuer, audience, or expiry check failed.
    #[error("token validation failed: {0}")]
    InvalidToken(String),

    /// The verification endpoint answered with something unusable.
    #[error("unexpected verification response: {0}")]
    BadResponse(String),

    /// The verification endpoint or key set could not be reached.
    #[error("verification endpoint unavailable: {0}")]
    Unavailable(String),
}

/// Authentication errors surfaced to the gateway.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// No `Authorization` header was sent.
    #[error("missing authorization header")]
    MissingCredential,

    /// The `Authorization` header is not a usable bearer credential.
    #[error("invalid authorization header: {0}")]
    InvalidFormat(&'static str),

    /// The credential failed verification.
    #[error("credential rejected: {0}")]
    Rejected(VerificationFailure),
}

impl AuthError {
    /// Caller-facing message. Details stay in the logs.
    pub fn public_message(&self) -> &'static str {
        AUTHENTICATION_REQUIRED
    }
}

/// Result type for authentication.
pub type Result<T> = std::result::Result<T, AuthError>;
