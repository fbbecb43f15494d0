//! Verified caller identity.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Normalized result of a successful credential verification.
///
/// Fields are private so a record cannot be altered after the verifier
/// produced it. The raw credential is kept only so tool handlers can pass it
/// through to the HITL API; it never appears in `Debug` output or logs.
#[derive(Clone, PartialEq)]
pub struct IdentityRecord {
    credential: String,
    subject_id: String,
    scopes: BTreeSet<String>,
    attributes: Map<String, Value>,
    verified_at: DateTime<Utc>,
}

impl IdentityRecord {
    /// Create a record for a credential that has just passed verification.
    pub fn new(
        credential: impl Into<String>,
        subject_id: impl Into<String>,
        scopes: impl IntoIterator<Item = String>,
        attributes: Map<String, Value>,
    ) -> Self {
        Self {
            credential: credential.into(),
            subject_id: subject_id.into(),
            scopes: scopes.into_iter().collect(),
            attributes,
            verified_at: Utc::now(),
        }
    }

    /// The raw bearer value, for pass-through to the HITL API.
    pub fn credential(&self) -> &str {
        &self.credential
    }

    /// Stable identifier of the caller.
    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }

    /// Granted capabilities (possibly empty).
    pub fn scopes(&self) -> &BTreeSet<String> {
        &self.scopes
    }

    /// Check whether a scope was granted.
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.contains(scope)
    }

    /// Auxiliary claims carried for observability.
    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    /// Look up a single string attribute.
    pub fn attribute_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }

    /// When verification succeeded.
    pub fn verified_at(&self) -> DateTime<Utc> {
        self.verified_at
    }

    /// Log-safe fingerprint of the credential.
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.credential)
    }
}

impl std::fmt::Debug for IdentityRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityRecord")
            .field("credential", &format_args!("<{}>", self.fingerprint()))
            .field("subject_id", &self.subject_id)
            .field("scopes", &self.scopes)
            .field("attributes", &self.attributes)
            .field("verified_at", &self.verified_at)
            .finish()
    }
}

/// First 8 hex characters of the SHA-256 of a credential.
pub fn fingerprint(credential: &str) -> String {
    let digest = Sha256::digest(credential.as_bytes());
    digest.iter().take(4).map(|b| format!("{b:02x}")).collect()
}
