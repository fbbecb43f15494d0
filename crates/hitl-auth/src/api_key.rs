//! Opaque API key verification against the HITL key-test endpoint.

use std::sync::Arc;

use async_trait::async_trait;
use hitl_client::{KeyInfo, LoopsApi};
use serde_json::{Map, Value};

use crate::error::VerificationFailure;
use crate::identity::{IdentityRecord, fingerprint};
use crate::verifier::CredentialVerifier;

/// Verifies API keys by calling `GET /test` with the key itself.
pub struct ApiKeyVerifier {
    api: Arc<dyn LoopsApi>,
}

impl ApiKeyVerifier {
    pub fn new(api: Arc<dyn LoopsApi>) -> Self {
        Self { api }
    }

    fn identity_from(
        credential: &str,
        info: KeyInfo,
    ) -> Result<IdentityRecord, VerificationFailure> {
        let subject = info
            .user_id
            .clone()
            .filter(|s| !s.is_empty())
            .or_else(|| info.api_key_id.clone().filter(|s| !s.is_empty()))
            .ok_or_else(|| {
                VerificationFailure::BadResponse("key info carries no user or key id".to_string())
            })?;

        let mut attributes: Map<String, Value> = info.extra;
        if let Some(email) = info.email {
            attributes.insert("email".to_string(), Value::String(email));
        }
        if let Some(status) = info.account_status {
            attributes.insert("account_status".to_string(), Value::String(status));
        }
        if let Some(key_id) = info.api_key_id {
            attributes.insert("api_key_id".to_string(), Value::String(key_id));
        }

        Ok(IdentityRecord::new(
            credential,
            subject,
            info.permissions,
            attributes,
        ))
    }
}

#[async_trait]
impl CredentialVerifier for ApiKeyVerifier {
    fn name(&self) -> &'static str {
        "api_key"
    }

    async fn verify(&self, credential: &str) -> Result<IdentityRecord, VerificationFailure> {
        if credential.trim().is_empty() {
            return Err(VerificationFailure::Malformed("empty api key".to_string()));
        }

        let response = match self.api.test_key(credential).await {
            Ok(response) => response,
            Err(e) if matches!(e.status(), Some(401 | 403 | 404)) => {
                return Err(VerificationFailure::Rejected(e.to_string()));
            }
            Err(e) if e.is_transport() => {
                return Err(VerificationFailure::Unavailable(e.to_string()));
            }
            Err(e) => return Err(VerificationFailure::BadResponse(e.to_string())),
        };

        let data = response.data.ok_or_else(|| {
            VerificationFailure::BadResponse("key test response has no data".to_string())
        })?;
        let info: KeyInfo = serde_json::from_value(data)
            .map_err(|e| VerificationFailure::BadResponse(e.to_string()))?;

        let identity = Self::identity_from(credential, info)?;
        tracing::debug!(
            credential = %fingerprint(credential),
            subject = %identity.subject_id(),
            "API key verified"
        );
        Ok(identity)
    }
}
