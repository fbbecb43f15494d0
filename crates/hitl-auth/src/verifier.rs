//! Credential verification strategy.

use async_trait::async_trait;

use crate::error::VerificationFailure;
use crate::identity::IdentityRecord;

/// Turns a bearer credential into an identity.
///
/// Implementations must not panic or surface transport errors as anything
/// other than a [`VerificationFailure`]; the caller treats every failure as
/// "unauthenticated".
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Short strategy name used in logs.
    fn name(&self) -> &'static str;

    /// Verify a credential.
    async fn verify(&self, credential: &str) -> Result<IdentityRecord, VerificationFailure>;
}
