//! Bearer header parsing and cached verification.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::cache::{CredentialCache, DEFAULT_CACHE_TTL};
use crate::context;
use crate::error::{AuthError, Result, VerificationFailure};
use crate::identity::{IdentityRecord, fingerprint};
use crate::verifier::CredentialVerifier;

/// Largest `Authorization` header accepted.
pub const MAX_AUTH_HEADER_BYTES: usize = 8 * 1024;

/// Extract the credential from an `Authorization: Bearer <value>` header.
///
/// The scheme is matched case-insensitively and surrounding whitespace is
/// ignored; the credential itself is returned verbatim.
pub fn parse_bearer_token(header: Option<&str>) -> Result<&str> {
    let header = header.ok_or(AuthError::MissingCredential)?;
    if header.len() > MAX_AUTH_HEADER_BYTES {
        return Err(AuthError::InvalidFormat("authorization header too large"));
    }

    let (scheme, token) = header
        .trim()
        .split_once(' ')
        .ok_or(AuthError::InvalidFormat("expected 'Bearer <credential>'"))?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidFormat("unsupported authorization scheme"));
    }
    if token.is_empty() {
        return Err(AuthError::InvalidFormat("empty bearer credential"));
    }
    Ok(token)
}

// ─────────────────────────────────────────────────────────────────────────────
// Cached verifier
// ─────────────────────────────────────────────────────────────────────────────

/// A verifier that consults a cache before delegating.
///
/// Only successes are cached, so a rejected credential is re-verified on
/// every attempt and a revoked one stops working once its entry expires.
pub struct CachedVerifier {
    inner: Arc<dyn CredentialVerifier>,
    cache: Arc<dyn CredentialCache>,
    ttl: Duration,
}

impl CachedVerifier {
    pub fn new(inner: Arc<dyn CredentialVerifier>, cache: Arc<dyn CredentialCache>) -> Self {
        Self {
            inner,
            cache,
            ttl: DEFAULT_CACHE_TTL,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Verify through the cache, sharing the cached record.
    pub async fn verify_shared(
        &self,
        credential: &str,
    ) -> std::result::Result<Arc<IdentityRecord>, VerificationFailure> {
        if let Some(identity) = self.cache.get(credential) {
            tracing::trace!(credential = %fingerprint(credential), "Verification cache hit");
            return Ok(identity);
        }

        let identity = Arc::new(self.inner.verify(credential).await?);
        self.cache.put(credential, Arc::clone(&identity), self.ttl);
        Ok(identity)
    }
}

#[async_trait]
impl CredentialVerifier for CachedVerifier {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn verify(
        &self,
        credential: &str,
    ) -> std::result::Result<IdentityRecord, VerificationFailure> {
        self.verify_shared(credential)
            .await
            .map(|identity| (*identity).clone())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Authenticator
// ─────────────────────────────────────────────────────────────────────────────

/// Turns an `Authorization` header into a verified identity.
#[derive(Clone)]
pub struct Authenticator {
    verifier: Arc<CachedVerifier>,
}

impl Authenticator {
    pub fn new(verifier: CachedVerifier) -> Self {
        Self {
            verifier: Arc::new(verifier),
        }
    }

    /// Strategy name of the underlying verifier.
    pub fn strategy(&self) -> &'static str {
        self.verifier.name()
    }

    /// Verify a bare credential.
    pub async fn authenticate(&self, credential: &str) -> Result<Arc<IdentityRecord>> {
        match self.verifier.verify_shared(credential).await {
            Ok(identity) => Ok(identity),
            Err(failure) => {
                tracing::warn!(
                    credential = %fingerprint(credential),
                    strategy = self.strategy(),
                    reason = %failure,
                    "Credential verification failed"
                );
                Err(AuthError::Rejected(failure))
            }
        }
    }

    /// Parse and verify an `Authorization` header value.
    pub async fn authenticate_header(&self, header: Option<&str>) -> Result<Arc<IdentityRecord>> {
        let credential = parse_bearer_token(header).inspect_err(|e| {
            tracing::debug!(error = %e, "Rejected authorization header");
        })?;
        self.authenticate(credential).await
    }

    /// Identity for the running call.
    ///
    /// Uses the identity bound by [`context::scope`] when present, otherwise
    /// verifies the transport header again.
    pub async fn resolve(&self, header: Option<&str>) -> Result<Arc<IdentityRecord>> {
        if let Some(identity) = context::current() {
            return Ok(identity);
        }
        tracing::debug!("No bound identity, verifying transport header");
        self.authenticate_header(header).await
    }
}
