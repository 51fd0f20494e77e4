use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use pulsefeed_core::{
    Card, FeedStatus, Series, Timeframe, TimeframeKey, build_cards, slice_window,
};

/// Dashboard-ready projection of one series at one instant.
///
/// Produced by [`aggregate`] and by the view methods on
/// [`PulseFeed`](crate::PulseFeed). Pure data; rendering it causes no I/O.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    /// Headline value, taken from the series tail (or, for global views, the
    /// market snapshot when one is present).
    pub current_value: Option<f64>,
    /// One change card per timeframe with data behind it.
    pub cards: BTreeMap<TimeframeKey, Card>,
    /// Points inside the selected timeframe's window, ready to chart.
    pub visible_slice: Series,
    /// Set when history does not reach back over the selected window.
    pub coverage_note: Option<String>,
    /// Feed health to display alongside the data.
    pub status: FeedStatus,
}

/// Project `series` into a [`DashboardView`] for the selected timeframe.
///
/// Deterministic in its inputs: aggregating the same series at the same
/// instant yields the same view, so callers may re-run it freely. An empty
/// series yields a syncing view with no cards; otherwise the view is live
/// with one card per timeframe.
#[must_use]
pub fn aggregate(series: &Series, timeframe: Timeframe, end_ts: DateTime<Utc>) -> DashboardView {
    let cards = build_cards(series, end_ts, Timeframe::all());
    let (visible_slice, _) = slice_window(series, end_ts, timeframe.window());
    // The per-card note for the selected timeframe doubles as the view note.
    let coverage_note = cards
        .get(&timeframe.key)
        .and_then(|c| c.coverage_note.clone());
    DashboardView {
        current_value: series.last().map(|p| p.val),
        cards,
        visible_slice,
        coverage_note,
        status: if series.is_empty() {
            FeedStatus::Syncing
        } else {
            FeedStatus::Live
        },
    }
}
