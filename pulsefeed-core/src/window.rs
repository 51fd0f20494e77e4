//! Pure windowing engine.
//!
//! Converts a raw ordered series into per-timeframe change cards and bounded
//! chart slices. Every function here is free of I/O and hidden state; the
//! aggregator and the routers build on these primitives.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};

use crate::types::{Card, Point, Series, Timeframe, TimeframeKey};
use crate::FeedError;

/// Binary search for the first point at or after `ts`.
///
/// When every point precedes `ts` the series' first point is returned
/// instead: the window start anchors to the earliest available data rather
/// than failing. Partial coverage is reported separately (see
/// [`slice_window`] and the coverage note on [`Card`]).
///
/// # Errors
/// Returns `FeedError::EmptySeries` only when the series has zero points.
pub fn first_at_or_after(series: &Series, ts: DateTime<Utc>) -> Result<&Point, FeedError> {
    let points = series.points();
    if points.is_empty() {
        return Err(FeedError::EmptySeries);
    }
    let idx = points.partition_point(|p| p.ts < ts);
    Ok(points.get(idx).unwrap_or(&points[0]))
}

/// Percentage change from `start` to `end`.
///
/// Returns `0.0` when `start` is zero or either value is non-finite. This is
/// a defined fallback, not an error: division by zero must not leak NaN or
/// infinity into the display layer.
#[must_use]
pub fn percent_change(start: f64, end: f64) -> f64 {
    if start == 0.0 || !start.is_finite() || !end.is_finite() {
        return 0.0;
    }
    (end - start) / start * 100.0
}

/// Slice the series to the window ending at `end_ts`.
///
/// The slice holds exactly the points with timestamps in
/// `[max(end_ts - window, earliest), end_ts]`, in series order. The flag is
/// `false` when the series' earliest timestamp is later than
/// `end_ts - window`, i.e. the requested window is not fully covered by
/// available history. An empty series yields an empty, uncovered slice.
#[must_use]
pub fn slice_window(series: &Series, end_ts: DateTime<Utc>, window: Duration) -> (Series, bool) {
    let points = series.points();
    let Some(first) = points.first() else {
        return (Series::new(), false);
    };
    let start = end_ts - window;
    let covered = first.ts <= start;
    let lo = points.partition_point(|p| p.ts < start);
    let hi = points.partition_point(|p| p.ts <= end_ts);
    let slice = if lo < hi {
        Series::from_ordered(points[lo..hi].to_vec())
    } else {
        Series::new()
    };
    (slice, covered)
}

/// Build one change card per timeframe.
///
/// Each card anchors at the first point at or after `end_ts - window` and
/// measures against the series' last point. Timeframes whose window reaches
/// back past the earliest sample carry a coverage note. An empty series
/// yields an empty map (the "syncing" state); a single-point series yields a
/// zero change for every timeframe.
#[must_use]
pub fn build_cards(
    series: &Series,
    end_ts: DateTime<Utc>,
    timeframes: &[Timeframe],
) -> BTreeMap<TimeframeKey, Card> {
    let mut cards = BTreeMap::new();
    let Some(last) = series.last() else {
        return cards;
    };
    for tf in timeframes {
        let start = end_ts - tf.window();
        let Ok(anchor) = first_at_or_after(series, start) else {
            continue;
        };
        let covered = series.first().is_some_and(|p| p.ts <= start);
        cards.insert(
            tf.key,
            Card {
                change_pct: percent_change(anchor.val, last.val),
                coverage_note: (!covered).then(|| coverage_note(series)),
            },
        );
    }
    cards
}

fn coverage_note(series: &Series) -> String {
    series.first().map_or_else(
        || "no history available".to_string(),
        |p| format!("history starts {}", p.ts.to_rfc3339()),
    )
}
