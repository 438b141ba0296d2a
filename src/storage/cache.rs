use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use lru::LruCache;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// Default TTL for cached entries (1 hour)
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// Default number of entries kept before the least recently used is evicted
pub const DEFAULT_CAPACITY: usize = 64;

/// Well-known cache slots and their lifetimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSlot {
    /// The raw normalized feed (1 hour)
    Feed,
    /// Article lists derived from the feed (2 hours)
    Articles,
    /// The short "latest insights" selection (30 minutes)
    Insights,
}

impl CacheSlot {
    pub fn key(self) -> &'static str {
        match self {
            CacheSlot::Feed => "kcm-feed",
            CacheSlot::Articles => "kcm-articles",
            CacheSlot::Insights => "market-insights",
        }
    }

    pub fn ttl(self) -> Duration {
        match self {
            CacheSlot::Feed => Duration::from_secs(60 * 60),
            CacheSlot::Articles => Duration::from_secs(2 * 60 * 60),
            CacheSlot::Insights => Duration::from_secs(30 * 60),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub written_at: Instant,
    pub ttl: Duration,
}

impl<V> CacheEntry<V> {
    /// Valid while less than `ttl` has elapsed since the write.
    pub fn is_valid_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.written_at) < self.ttl
    }
}

/// Result of [`TtlCache::lookup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<V> {
    Fresh(V),
    /// The entry had expired. It has been removed from the cache; the value
    /// is handed back once so callers can fall back to it.
    Stale(V),
    Miss,
}

impl<V> Lookup<V> {
    pub fn fresh(self) -> Option<V> {
        match self {
            Lookup::Fresh(v) => Some(v),
            Lookup::Stale(_) | Lookup::Miss => None,
        }
    }
}

/// Point-in-time entry counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub total: usize,
    pub valid: usize,
    pub stale: usize,
}

/// In-memory TTL cache with LRU eviction.
///
/// Entries move from valid to expired as time passes and are removed on the
/// next read or [`sweep`](Self::sweep). The cache never fails: a lock
/// poisoned by a panicking writer is recovered rather than propagated.
///
/// Time comes from [`tokio::time::Instant`], so tests can drive expiry with
/// a paused runtime.
#[derive(Debug)]
pub struct TtlCache<V> {
    entries: Mutex<LruCache<String, CacheEntry<V>>>,
    default_ttl: Duration,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(capacity: usize, default_ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    fn entries(&self) -> MutexGuard<'_, LruCache<String, CacheEntry<V>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store `value` under `key`, replacing any existing entry.
    /// `None` uses the cache's default TTL.
    pub fn put(&self, key: &str, value: V, ttl: Option<Duration>) {
        let entry = CacheEntry {
            value,
            written_at: Instant::now(),
            ttl: ttl.unwrap_or(self.default_ttl),
        };
        if let Some((evicted, _)) = self.entries().push(key.to_string(), entry) {
            if evicted != key {
                tracing::debug!(key = %evicted, "Evicted least recently used cache entry");
            }
        }
    }

    /// Valid value for `key`. Expired entries are removed and read as a miss.
    pub fn get(&self, key: &str) -> Option<V> {
        self.lookup(key).fresh()
    }

    /// Like [`get`](Self::get), but an expired entry's value is returned as
    /// [`Lookup::Stale`] as it is removed.
    pub fn lookup(&self, key: &str) -> Lookup<V> {
        let now = Instant::now();
        let mut entries = self.entries();

        let valid = match entries.get(key) {
            Some(entry) => entry.is_valid_at(now),
            None => return Lookup::Miss,
        };

        if valid {
            match entries.get(key) {
                Some(entry) => Lookup::Fresh(entry.value.clone()),
                None => Lookup::Miss,
            }
        } else {
            match entries.pop(key) {
                Some(entry) => {
                    tracing::debug!(key = %key, "Cache entry expired");
                    Lookup::Stale(entry.value)
                }
                None => Lookup::Miss,
            }
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        let now = Instant::now();
        self.entries()
            .peek(key)
            .is_some_and(|entry| entry.is_valid_at(now))
    }

    pub fn remove(&self, key: &str) -> bool {
        self.entries().pop(key).is_some()
    }

    /// Remove every expired entry, returning how many were dropped.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries();
        let expired: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| !entry.is_valid_at(now))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            entries.pop(key);
        }
        expired.len()
    }

    pub fn clear(&self) {
        self.entries().clear();
    }

    /// Entries currently held, expired ones included.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let entries = self.entries();
        let valid = entries
            .iter()
            .filter(|(_, entry)| entry.is_valid_at(now))
            .count();
        CacheStats {
            total: entries.len(),
            valid,
            stale: entries.len() - valid,
        }
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_TTL)
    }
}

/// A cache of heterogeneous values stored as JSON.
pub type JsonCache = TtlCache<serde_json::Value>;

impl TtlCache<serde_json::Value> {
    /// Serialize and store `value`. Values that cannot be serialized are
    /// logged and not cached.
    pub fn put_as<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Option<Duration>) {
        match serde_json::to_value(value) {
            Ok(json) => self.put(key, json, ttl),
            Err(e) => tracing::warn!(key = %key, error = %e, "Failed to serialize cache entry"),
        }
    }

    /// Typed [`get`](Self::get).
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.lookup_as(key).fresh()
    }

    /// Typed [`lookup`](Self::lookup). An entry that does not deserialize as
    /// `T` is discarded and reads as a miss.
    pub fn lookup_as<T: DeserializeOwned>(&self, key: &str) -> Lookup<T> {
        let decode = |json: serde_json::Value| match serde_json::from_value::<T>(json) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Discarding unreadable cache entry");
                self.remove(key);
                None
            }
        };

        match self.lookup(key) {
            Lookup::Fresh(json) => decode(json).map_or(Lookup::Miss, Lookup::Fresh),
            Lookup::Stale(json) => decode(json).map_or(Lookup::Miss, Lookup::Stale),
            Lookup::Miss => Lookup::Miss,
        }
    }
}
