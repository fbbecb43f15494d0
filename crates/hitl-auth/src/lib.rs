//! Authentication for the HITL gateway.
//!
//! A bearer credential is verified by one of two strategies behind
//! [`CredentialVerifier`]:
//!
//! - [`ApiKeyVerifier`]: asks the HITL API whether an opaque key is valid.
//! - [`JwtVerifier`]: checks a signed token against the issuer's key set.
//!
//! [`CachedVerifier`] memoizes successes for a fixed TTL, [`Authenticator`]
//! parses the `Authorization` header, and [`context`] binds the resulting
//! [`IdentityRecord`] to the task serving the call.

pub mod api_key;
pub mod authenticator;
pub mod cache;
pub mod context;
pub mod error;
pub mod identity;
pub mod jwt;
pub mod verifier;

pub use api_key::ApiKeyVerifier;
pub use authenticator::{Authenticator, CachedVerifier, MAX_AUTH_HEADER_BYTES, parse_bearer_token};
pub use cache::{
    CacheStats, CredentialCache, DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL, TtlCache,
};
pub use error::{AUTHENTICATION_REQUIRED, AuthError, Result, VerificationFailure};
pub use identity::{IdentityRecord, fingerprint};
pub use jwt::{DEFAULT_JWKS_TTL, JwksCache, JwtSettings, JwtVerifier, default_jwks_url};
pub use verifier::CredentialVerifier;

/// Re-exported so configuration can name signing algorithms.
pub use jsonwebtoken::Algorithm;
