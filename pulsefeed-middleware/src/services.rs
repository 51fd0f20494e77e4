use std::collections::HashMap;
use std::sync::Mutex;

use pulsefeed_core::{MarketSnapshot, Series};

use crate::backoff::BackoffTracker;
use crate::cache::TtlCache;

/// Shared middleware state for one engine instance.
///
/// Bundles the snapshot and chart caches, the backoff tracker, and the
/// per-asset hydration sequence counters. Caches are partitioned by payload
/// type so a snapshot entry can never shadow a chart entry.
pub struct FeedServices {
    /// Snapshot cache, read with the snapshot TTL.
    pub snapshots: TtlCache<MarketSnapshot>,
    /// Chart cache, read with the chart TTL. Keyed by asset and resolution.
    pub charts: TtlCache<Series>,
    /// Cooldown gate shared by every remote operation.
    pub backoff: BackoffTracker,
    sequences: Mutex<HashMap<String, u64>>,
}

impl FeedServices {
    /// Create empty middleware state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            snapshots: TtlCache::new(),
            charts: TtlCache::new(),
            backoff: BackoffTracker::new(),
            sequences: Mutex::new(HashMap::new()),
        }
    }

    /// Allocate the next hydration sequence number for `asset`.
    ///
    /// Sequence numbers are per asset and strictly increasing; a hydration
    /// run only publishes its result while it still holds the latest number.
    ///
    /// # Panics
    /// Panics if the internal mutex is poisoned.
    pub fn next_sequence(&self, asset: &str) -> u64 {
        let mut sequences = self.sequences.lock().expect("mutex poisoned");
        let seq = sequences.entry(asset.to_string()).or_insert(0);
        *seq += 1;
        *seq
    }

    /// Latest sequence number issued for `asset`, or zero if none.
    ///
    /// # Panics
    /// Panics if the internal mutex is poisoned.
    pub fn current_sequence(&self, asset: &str) -> u64 {
        let sequences = self.sequences.lock().expect("mutex poisoned");
        sequences.get(asset).copied().unwrap_or(0)
    }
}

impl Default for FeedServices {
    fn default() -> Self {
        Self::new()
    }
}
