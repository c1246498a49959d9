//! Thread-safe key/value cache with per-entry expiry.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::warn;

struct CacheEntry<V> {
    value: V,
    /// `None` when the TTL is too large to represent; such entries never expire.
    expires_at: Option<Instant>,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// Key/value cache where every entry carries its own expiry.
///
/// Expired entries are never returned; they are dropped lazily when a `get`
/// runs into them. All operations go through one mutex, so concurrent
/// callers see a consistent view.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use coinfeed_core::cache::TtlCache;
///
/// let cache = TtlCache::new(Duration::from_secs(300));
/// cache.set("top_by_volume:10", vec![1, 2, 3]);
/// assert_eq!(cache.get("top_by_volume:10"), Some(vec![1, 2, 3]));
///
/// cache.set_with_ttl("stale", vec![], Duration::ZERO);
/// assert_eq!(cache.get("stale"), None);
/// ```
pub struct TtlCache<V> {
    default_ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            default_ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Returns a copy of the value if present and not expired.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let mut entries = self.lock_entries();

        match entries.get(key) {
            Some(entry) if !entry.is_expired(now) => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Stores `value` under `key` with the default TTL, replacing any entry.
    pub fn set(&self, key: impl Into<String>, value: V) {
        self.set_with_ttl(key, value, self.default_ttl);
    }

    /// Stores `value` under `key` with an explicit TTL.
    ///
    /// A zero TTL stores an already-expired entry.
    pub fn set_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now().checked_add(ttl),
        };
        self.lock_entries().insert(key.into(), entry);
    }

    pub fn invalidate(&self, key: &str) {
        self.lock_entries().remove(key);
    }

    pub fn clear(&self) {
        self.lock_entries().clear();
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.lock_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lock the entries mutex, recovering from poison if necessary.
    fn lock_entries(&self) -> MutexGuard<'_, HashMap<String, CacheEntry<V>>> {
        self.entries.lock().unwrap_or_else(|poisoned| {
            warn!("TTL cache mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }
}
