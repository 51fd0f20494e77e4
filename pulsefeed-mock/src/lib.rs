//! Scriptable in-memory collaborators for exercising the reconciliation
//! engine without a network or a database.
//!
//! [`MockMarketService`] replays scripted outcomes (optionally delayed) and
//! falls back to per-asset defaults; [`MockLocalStore`] keeps rows in memory
//! and fans inserts out to push subscribers.

mod market;
mod store;

pub use crate::market::MockMarketService;
pub use crate::store::MockLocalStore;

use chrono::DateTime;
use pulsefeed_core::{MarketSnapshot, Point, Series, StoreRow};

/// Snapshot fixture with only the current value populated.
///
/// # Panics
/// Panics on an out-of-range epoch second (test fixture).
#[must_use]
pub fn snapshot_fixture(value: f64) -> MarketSnapshot {
    MarketSnapshot {
        current_value: value,
        high_24h: None,
        low_24h: None,
        volume: None,
        market_cap: None,
        updated_at: DateTime::from_timestamp(0, 0).unwrap(),
    }
}

/// Series fixture from `(epoch_seconds, value)` pairs.
///
/// # Panics
/// Panics on an out-of-range epoch second (test fixture).
#[must_use]
pub fn series_fixture(points: &[(i64, f64)]) -> Series {
    Series::from_points(
        points
            .iter()
            .map(|&(s, v)| Point::new(DateTime::from_timestamp(s, 0).unwrap(), v)),
    )
}

/// Raw store row fixture at the given epoch second.
///
/// # Panics
/// Panics on an out-of-range epoch second (test fixture).
#[must_use]
pub fn row_fixture(asset: &str, secs: i64, value: f64) -> StoreRow {
    StoreRow::new(
        asset,
        DateTime::from_timestamp(secs, 0).unwrap().to_rfc3339(),
        value.to_string(),
    )
}
