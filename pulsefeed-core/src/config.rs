//! Configuration constants supplied by the host process.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Global configuration for the pulsefeed engine.
///
/// Defaults mirror the behavior of the dashboard this engine backs: snapshot
/// responses are considered fresh for a minute, chart responses for three,
/// and a rate-limited source rests for a full minute before the next attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Freshness window for cached market snapshots.
    pub snapshot_ttl: Duration,
    /// Freshness window for cached chart series.
    pub chart_ttl: Duration,
    /// Cooldown applied to a source after a rate-limit signal. Long enough
    /// to avoid hot looping against the limit, short enough that recovery
    /// needs no restart.
    pub backoff_cooldown: Duration,
    /// Bound on every individual network operation; expiry counts as
    /// failure for backoff and status purposes.
    pub request_timeout: Duration,
    /// Suggested polling cadence for hosts that refresh global assets on a
    /// timer. The engine itself does not schedule.
    pub refresh_interval: Duration,
    /// Maximum element count of the local stream buffer; the oldest
    /// elements are dropped beyond this (sliding window).
    pub buffer_cap: usize,
    /// Row count loaded from the Local Store when seeding the buffer.
    pub initial_snapshot_rows: usize,
    /// Row count requested per backward-pagination page.
    pub page_size: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            snapshot_ttl: Duration::from_secs(60),
            chart_ttl: Duration::from_secs(180),
            backoff_cooldown: Duration::from_secs(60),
            request_timeout: Duration::from_secs(10),
            refresh_interval: Duration::from_secs(5),
            buffer_cap: 5000,
            initial_snapshot_rows: 500,
            page_size: 200,
        }
    }
}
