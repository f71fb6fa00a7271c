//! TTL-bounded key/value storage.
//!
//! Entries are never evicted for size. Expiration is checked on read and
//! enforced physically only by [`TtlCache::sweep`].

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::RwLock;
use std::time::Duration;

use metrics::counter;
use tokio::time::Instant;
use tracing::debug;

use super::lock::{rw_read, rw_write};
use super::{METRIC_CACHE_HIT, METRIC_CACHE_MISS, METRIC_CACHE_SWEPT};
use crate::infra::sweeper::Sweep;

const SOURCE: &str = "cache::store";

/// Upper bound used when `now + ttl` does not fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(60 * 60 * 24 * 365 * 30);

struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Generic in-memory cache with per-entry expiration.
///
/// Readers share the lock; `set`, `delete`, `clear` and `sweep` take it
/// exclusively. Values are cloned out, so store cheap handles (`Arc`) for
/// large payloads.
pub struct TtlCache<K, V> {
    entries: RwLock<HashMap<K, CacheEntry<V>>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the value when present and not yet expired.
    ///
    /// An expired entry stays in the map until the next sweep; it is only
    /// hidden from callers.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = Instant::now();
        let guard = rw_read(&self.entries, SOURCE, "get");
        match guard.get(key) {
            Some(entry) if !entry.is_expired(now) => {
                counter!(METRIC_CACHE_HIT).increment(1);
                Some(entry.value.clone())
            }
            _ => {
                counter!(METRIC_CACHE_MISS).increment(1);
                None
            }
        }
    }

    pub fn set(&self, key: K, value: V, ttl: Duration) {
        let now = Instant::now();
        let expires_at = now
            .checked_add(ttl)
            .unwrap_or_else(|| now + FAR_FUTURE);
        rw_write(&self.entries, SOURCE, "set").insert(key, CacheEntry { value, expires_at });
    }

    pub fn delete<Q>(&self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        rw_write(&self.entries, SOURCE, "delete").remove(key);
    }

    pub fn clear(&self) {
        rw_write(&self.entries, SOURCE, "clear").clear();
    }

    /// Physically removes every expired entry and returns how many were dropped.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut guard = rw_write(&self.entries, SOURCE, "sweep");
        let before = guard.len();
        guard.retain(|_, entry| !entry.is_expired(now));
        let removed = before - guard.len();
        drop(guard);

        if removed > 0 {
            counter!(METRIC_CACHE_SWEPT).increment(removed as u64);
            debug!(removed, "swept expired cache entries");
        }
        removed
    }

    /// Number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V> Default for TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Sweep for TtlCache<K, V>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn sweep(&self) -> usize {
        TtlCache::sweep(self)
    }
}
