//! Signed-token (JWT) verification against a remote key set.
//!
//! Tokens are checked locally: signature against a key from the issuer's
//! JWKS document, then issuer, audience, and expiry. The key set is cached
//! for a configurable period and refreshed when a token names a key id the
//! cached set does not contain, at most once per [`MIN_FORCED_REFRESH_INTERVAL`].

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::jwk::{Jwk, JwkSet};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use tokio::time::Instant;

use crate::error::VerificationFailure;
use crate::identity::{IdentityRecord, fingerprint};
use crate::verifier::CredentialVerifier;

/// Default lifetime of a fetched key set.
pub const DEFAULT_JWKS_TTL: Duration = Duration::from_secs(10 * 60);

/// Allowed clock skew when checking `exp` and `nbf`.
pub const DEFAULT_LEEWAY_SECS: u64 = 30;

/// Timeout for key set fetches.
const JWKS_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Unknown key ids trigger at most one refetch per interval.
pub const MIN_FORCED_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Settings for [`JwtVerifier`].
#[derive(Debug, Clone)]
pub struct JwtSettings {
    /// Required `iss` claim.
    pub issuer: String,
    /// Required `aud` claim (must be one of the token's audiences).
    pub audience: String,
    /// Where to fetch the JWKS document.
    pub jwks_url: String,
    /// Accepted signing algorithms.
    pub algorithms: Vec<Algorithm>,
    /// How long a fetched key set is trusted.
    pub jwks_ttl: Duration,
    /// Clock skew tolerance in seconds.
    pub leeway_secs: u64,
}

impl JwtSettings {
    /// Settings with the JWKS document at `<issuer>/.well-known/jwks.json`.
    pub fn new(issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        let issuer = issuer.into();
        let jwks_url = default_jwks_url(&issuer);
        Self {
            issuer,
            audience: audience.into(),
            jwks_url,
            algorithms: vec![Algorithm::RS256],
            jwks_ttl: DEFAULT_JWKS_TTL,
            leeway_secs: DEFAULT_LEEWAY_SECS,
        }
    }

    pub fn with_jwks_url(mut self, url: impl Into<String>) -> Self {
        self.jwks_url = url.into();
        self
    }

    pub fn with_algorithms(mut self, algorithms: Vec<Algorithm>) -> Self {
        self.algorithms = algorithms;
        self
    }

    pub fn with_jwks_ttl(mut self, ttl: Duration) -> Self {
        self.jwks_ttl = ttl;
        self
    }

    pub fn with_leeway_secs(mut self, leeway: u64) -> Self {
        self.leeway_secs = leeway;
        self
    }

    fn validation(&self) -> Validation {
        let first = self.algorithms.first().copied().unwrap_or(Algorithm::RS256);
        let mut validation = Validation::new(first);
        if !self.algorithms.is_empty() {
            validation.algorithms = self.algorithms.clone();
        }
        validation.leeway = self.leeway_secs;
        validation.validate_nbf = true;
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_audience(&[self.audience.as_str()]);
        validation.required_spec_claims =
            ["exp", "iss", "aud", "sub"].iter().map(|c| c.to_string()).collect::<HashSet<_>>();
        validation
    }
}

/// Conventional JWKS location for an issuer.
pub fn default_jwks_url(issuer: &str) -> String {
    format!("{}/.well-known/jwks.json", issuer.trim_end_matches('/'))
}

// ─────────────────────────────────────────────────────────────────────────────
// Key set cache
// ─────────────────────────────────────────────────────────────────────────────

struct CachedKeySet {
    keys: Arc<JwkSet>,
    fetched_at: Instant,
}

/// Fetches and caches the issuer's JWKS document.
pub struct JwksCache {
    http: reqwest::Client,
    url: String,
    ttl: Duration,
    cached: Mutex<Option<CachedKeySet>>,
    last_forced: Mutex<Option<Instant>>,
}

impl JwksCache {
    pub fn new(url: impl Into<String>, ttl: Duration) -> Result<Self, VerificationFailure> {
        let http = reqwest::Client::builder()
            .timeout(JWKS_FETCH_TIMEOUT)
            .build()
            .map_err(|e| VerificationFailure::Unavailable(e.to_string()))?;
        Ok(Self {
            http,
            url: url.into(),
            ttl,
            cached: Mutex::new(None),
            last_forced: Mutex::new(None),
        })
    }

    /// Return the cached key set, fetching when absent, stale, or `force`d.
    pub async fn keys(&self, force: bool) -> Result<Arc<JwkSet>, VerificationFailure> {
        if !force && let Some(keys) = self.fresh() {
            return Ok(keys);
        }

        let keys = Arc::new(self.fetch().await?);
        *self.cached.lock() = Some(CachedKeySet {
            keys: Arc::clone(&keys),
            fetched_at: Instant::now(),
        });
        Ok(keys)
    }

    /// Find a key by id, refreshing the set when it is missing and no forced
    /// refresh happened within [`MIN_FORCED_REFRESH_INTERVAL`].
    ///
    /// Tokens without a `kid` use the first key in the set.
    pub async fn find(&self, kid: Option<&str>) -> Result<Jwk, VerificationFailure> {
        let keys = self.keys(false).await?;
        let Some(kid) = kid else {
            return keys
                .keys
                .first()
                .cloned()
                .ok_or_else(|| VerificationFailure::InvalidToken("key set is empty".to_string()));
        };

        if let Some(jwk) = keys.find(kid) {
            return Ok(jwk.clone());
        }

        let unknown = || VerificationFailure::InvalidToken(format!("unknown key id '{kid}'"));
        if !self.claim_forced_refresh() {
            tracing::debug!(kid, "Unknown key id, refresh suppressed");
            return Err(unknown());
        }

        tracing::debug!(kid, "Unknown key id, refreshing key set");
        let keys = self.keys(true).await?;
        keys.find(kid).cloned().ok_or_else(unknown)
    }

    fn claim_forced_refresh(&self) -> bool {
        let mut last = self.last_forced.lock();
        if last.is_some_and(|at| at.elapsed() < MIN_FORCED_REFRESH_INTERVAL) {
            return false;
        }
        *last = Some(Instant::now());
        true
    }

    fn fresh(&self) -> Option<Arc<JwkSet>> {
        let cached = self.cached.lock();
        cached
            .as_ref()
            .filter(|c| c.fetched_at.elapsed() < self.ttl)
            .map(|c| Arc::clone(&c.keys))
    }

    async fn fetch(&self) -> Result<JwkSet, VerificationFailure> {
        tracing::debug!(url = %self.url, "Fetching key set");
        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| VerificationFailure::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(VerificationFailure::Unavailable(format!(
                "key set endpoint returned {status}"
            )));
        }

        response
            .json::<JwkSet>()
            .await
            .map_err(|e| VerificationFailure::BadResponse(e.to_string()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Verifier
// ─────────────────────────────────────────────────────────────────────────────

/// Verifies signed bearer tokens.
pub struct JwtVerifier {
    validation: Validation,
    jwks: JwksCache,
}

impl JwtVerifier {
    pub fn new(settings: JwtSettings) -> Result<Self, VerificationFailure> {
        let jwks = JwksCache::new(settings.jwks_url.clone(), settings.jwks_ttl)?;
        let validation = settings.validation();
        Ok(Self {
            validation,
            jwks,
        })
    }

    fn identity_from(
        token: &str,
        claims: Map<String, Value>,
    ) -> Result<IdentityRecord, VerificationFailure> {
        let subject = claims
            .get("sub")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .ok_or_else(|| VerificationFailure::InvalidToken("missing subject".to_string()))?;

        Ok(IdentityRecord::new(token, subject, scopes_from(&claims), claims))
    }
}

/// Scopes from `scope` (space separated) and `scp` (string or array).
fn scopes_from(claims: &Map<String, Value>) -> Vec<String> {
    let mut scopes = Vec::new();
    for key in ["scope", "scp"] {
        match claims.get(key) {
            Some(Value::String(s)) => scopes.extend(s.split_whitespace().map(str::to_string)),
            Some(Value::Array(items)) => {
                scopes.extend(items.iter().filter_map(Value::as_str).map(str::to_string))
            }
            _ => {}
        }
    }
    scopes
}

/// Read the unverified `iss` claim for diagnostics.
fn peek_issuer(payload: &str) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let claims: Map<String, Value> = serde_json::from_slice(&bytes).ok()?;
    claims.get("iss").and_then(Value::as_str).map(str::to_string)
}

#[async_trait]
impl CredentialVerifier for JwtVerifier {
    fn name(&self) -> &'static str {
        "jwt"
    }

    async fn verify(&self, credential: &str) -> Result<IdentityRecord, VerificationFailure> {
        let segments: Vec<&str> = credential.split('.').collect();
        if segments.len() != 3 || segments.iter().any(|s| s.is_empty()) {
            return Err(VerificationFailure::Malformed(
                "token must have three dot-separated segments".to_string(),
            ));
        }

        let claimed_issuer = peek_issuer(segments[1]);
        tracing::debug!(
            credential = %fingerprint(credential),
            issuer = claimed_issuer.as_deref().unwrap_or("<none>"),
            "Verifying token"
        );

        let header = jsonwebtoken::decode_header(credential)
            .map_err(|e| VerificationFailure::Malformed(e.to_string()))?;
        if !self.validation.algorithms.contains(&header.alg) {
            return Err(VerificationFailure::InvalidToken(format!(
                "algorithm {:?} is not accepted",
                header.alg
            )));
        }

        let jwk = self.jwks.find(header.kid.as_deref()).await?;
        let key = DecodingKey::from_jwk(&jwk)
            .map_err(|e| VerificationFailure::InvalidToken(e.to_string()))?;

        // Every listed algorithm must match the key family, so narrow to the
        // one the header names.
        let mut validation = self.validation.clone();
        validation.algorithms = vec![header.alg];

        let data = jsonwebtoken::decode::<Map<String, Value>>(credential, &key, &validation)
            .map_err(|e| VerificationFailure::InvalidToken(e.to_string()))?;

        Self::identity_from(credential, data.claims)
    }
}
