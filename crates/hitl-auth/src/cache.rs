//! TTL-bounded memo of credential → identity.
//!
//! Entries are keyed by the exact bearer string and expire a fixed time after
//! insertion. Expiry is checked lazily on lookup; there is no sweeper task.
//! Capacity is additionally bounded with LRU eviction so a flood of distinct
//! credentials cannot grow memory without limit.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use lru::LruCache;
use parking_lot::Mutex;
use tokio::time::Instant;

use crate::identity::IdentityRecord;

/// Default time a verified credential is trusted without re-verification.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Default maximum number of cached credentials.
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

/// Storage for verification outcomes.
///
/// Only successful verifications are stored. A cache never decides that a
/// credential is invalid; a miss simply means "verify again".
pub trait CredentialCache: Send + Sync {
    /// Look up a live entry. Expired entries are reported as absent.
    fn get(&self, credential: &str) -> Option<Arc<IdentityRecord>>;

    /// Store an identity for `ttl` from now.
    fn put(&self, credential: &str, identity: Arc<IdentityRecord>, ttl: Duration);
}

/// A cached identity and its expiry deadline.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The verified identity.
    pub identity: Arc<IdentityRecord>,
    /// Instant after which the entry must not be returned.
    pub expires_at: Instant,
}

impl CacheEntry {
    /// True while `now < expires_at`.
    pub fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Entries currently held (including not-yet-evicted expired ones).
    pub entries: usize,
    /// Maximum number of entries.
    pub capacity: usize,
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that found nothing live.
    pub misses: u64,
}

/// In-memory [`CredentialCache`] with TTL expiry and LRU eviction.
pub struct TtlCache {
    entries: Mutex<LruCache<String, CacheEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl TtlCache {
    /// Create a cache holding at most `capacity` credentials.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Current statistics.
    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.lock();
        CacheStats {
            entries: entries.len(),
            capacity: entries.cap().get(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl Default for TtlCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl CredentialCache for TtlCache {
    fn get(&self, credential: &str) -> Option<Arc<IdentityRecord>> {
        let now = Instant::now();
        let mut entries = self.entries.lock();

        let found = match entries.get(credential) {
            Some(entry) if entry.is_live(now) => Some(Arc::clone(&entry.identity)),
            Some(_) => {
                entries.pop(credential);
                None
            }
            None => None,
        };

        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    fn put(&self, credential: &str, identity: Arc<IdentityRecord>, ttl: Duration) {
        let entry = CacheEntry {
            identity,
            expires_at: Instant::now() + ttl,
        };
        self.entries.lock().put(credential.to_string(), entry);
    }
}
