//! Request-scoped identity.
//!
//! The gateway binds the verified identity to the task serving a call with
//! [`scope`]. Anything awaited inside that future sees the same identity via
//! [`current`]; concurrently running calls each see their own, and the
//! binding disappears when the future completes.

use std::future::Future;
use std::sync::Arc;

use crate::identity::IdentityRecord;

tokio::task_local! {
    static CURRENT_IDENTITY: Arc<IdentityRecord>;
}

/// Run `fut` with `identity` bound as the current caller.
pub async fn scope<F>(identity: Arc<IdentityRecord>, fut: F) -> F::Output
where
    F: Future,
{
    CURRENT_IDENTITY.scope(identity, fut).await
}

/// The identity bound by the innermost enclosing [`scope`], if any.
pub fn current() -> Option<Arc<IdentityRecord>> {
    CURRENT_IDENTITY.try_with(Arc::clone).ok()
}
