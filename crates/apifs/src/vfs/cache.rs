//! Expiring key/value cache for remote API results
//!
//! Every entry lives for a fixed time-to-live after it was populated. Entries
//! can also be dropped explicitly, which is how writes force the next lookup
//! back to the remote API. A key that was never inserted behaves exactly like
//! an expired one.

use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;

/// Default time-to-live for cache entries
pub const DEFAULT_TTL: Duration = Duration::from_secs(15);

/// Longest accepted time-to-live; longer values are clamped to it
pub const MAX_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// TTL-based cache with populate-on-miss semantics
///
/// Concurrent misses on the same key are coalesced: only one caller runs the
/// populate closure and the others wait for and share its result.
#[derive(Clone)]
pub struct ExpiringCache<V> {
    entries: Cache<String, V>,
    ttl: Duration,
}

impl<V> ExpiringCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create a cache whose entries expire `ttl` after being populated
    ///
    /// `ttl` is capped at [`MAX_TTL`].
    pub fn new(ttl: Duration) -> Self {
        let ttl = ttl.min(MAX_TTL);
        Self {
            entries: Cache::builder().time_to_live(ttl).build(),
            ttl,
        }
    }

    /// Return the live value for `key`, populating it on a miss
    pub fn get<F>(&self, key: &str, populate: F) -> V
    where
        F: FnOnce() -> V,
    {
        self.entries.get_with_by_ref(key, || {
            tracing::debug!(key, "cache miss, repopulating");
            populate()
        })
    }

    /// Fallible variant of [`get`](Self::get)
    ///
    /// When `populate` fails nothing is stored, so the next call tries again.
    /// Callers coalesced onto a failed populate all observe the same error.
    pub fn try_get<F, E>(&self, key: &str, populate: F) -> Result<V, Arc<E>>
    where
        F: FnOnce() -> Result<V, E>,
        E: Send + Sync + 'static,
    {
        self.entries.try_get_with_by_ref(key, || {
            tracing::debug!(key, "cache miss, repopulating");
            populate()
        })
    }

    /// Drop the entry for `key`, if any
    pub fn invalidate(&self, key: &str) {
        self.entries.invalidate(key);
    }
}

impl<V> Default for ExpiringCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl<V> std::fmt::Debug for ExpiringCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpiringCache")
            .field("ttl", &self.ttl)
            .field("entry_count", &self.entries.entry_count())
            .finish()
    }
}

#[cfg(test)]
impl<V> ExpiringCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Live entry for `key`, without populating it
    fn peek(&self, key: &str) -> Option<V> {
        self.entries.get(key)
    }

    fn ttl(&self) -> Duration {
        self.ttl
    }
}
