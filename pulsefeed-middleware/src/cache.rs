use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

struct Entry<V> {
    value: V,
    stored_at: Instant,
}

/// In-memory cache with per-read TTL semantics.
///
/// Entries carry no expiry of their own; freshness is judged at read time
/// against the TTL the caller supplies. The same entry can therefore be fresh
/// for one caller and stale for another, which is what lets snapshot and
/// chart reads share one implementation with different lifetimes.
///
/// Expired entries are removed when observed, not by a background sweeper.
pub struct TtlCache<V> {
    entries: Mutex<HashMap<String, Entry<V>>>,
}

impl<V: Clone> TtlCache<V> {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Look up `key`, treating entries older than `ttl` as absent.
    ///
    /// A stale entry is evicted before returning `None`.
    pub async fn get(&self, key: &str, ttl: Duration) -> Option<V> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.stored_at.elapsed() < ttl => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Store `value` under `key`, replacing any previous entry and resetting
    /// its age.
    pub async fn set(&self, key: impl Into<String>, value: V) {
        let mut entries = self.entries.lock().await;
        entries.insert(
            key.into(),
            Entry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    /// Number of entries currently held, stale ones included.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// True when the cache holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
