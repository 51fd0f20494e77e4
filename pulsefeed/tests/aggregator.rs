use chrono::{DateTime, Utc};
use pulsefeed::{aggregate, FeedStatus, Timeframe, TimeframeKey};
use pulsefeed_mock::series_fixture;

fn ts(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap()
}

#[test]
fn same_inputs_same_view() {
    let series = series_fixture(&[(0, 100.0), (1800, 105.0), (3600, 110.0)]);
    let tf = Timeframe::by_key(TimeframeKey::H1);
    let a = aggregate(&series, tf, ts(3600));
    let b = aggregate(&series, tf, ts(3600));
    assert_eq!(a, b);
}

#[test]
fn empty_series_is_syncing_with_no_cards() {
    let view = aggregate(
        &series_fixture(&[]),
        Timeframe::by_key(TimeframeKey::H24),
        ts(0),
    );
    assert_eq!(view.status, FeedStatus::Syncing);
    assert!(view.cards.is_empty());
    assert!(view.visible_slice.is_empty());
    assert!(view.current_value.is_none());
}

#[test]
fn view_carries_tail_value_and_window_slice() {
    // Two hours of samples, viewing the one-hour window.
    let series = series_fixture(&[(0, 100.0), (3600, 104.0), (5400, 106.0), (7200, 108.0)]);
    let view = aggregate(&series, Timeframe::by_key(TimeframeKey::H1), ts(7200));

    assert_eq!(view.status, FeedStatus::Live);
    assert_eq!(view.current_value, Some(108.0));
    let slice_ts: Vec<i64> = view
        .visible_slice
        .points()
        .iter()
        .map(|p| p.ts.timestamp())
        .collect();
    assert_eq!(slice_ts, vec![3600, 5400, 7200]);

    // Cards exist for every timeframe; the hour card measures from the anchor.
    assert_eq!(view.cards.len(), Timeframe::all().len());
    let hour = &view.cards[&TimeframeKey::H1];
    assert!((hour.change_pct - (108.0 - 104.0) / 104.0 * 100.0).abs() < 1e-9);
    assert!(hour.coverage_note.is_none());
}

#[test]
fn note_set_when_history_is_short() {
    let series = series_fixture(&[(0, 100.0), (60, 110.0)]);
    let view = aggregate(&series, Timeframe::by_key(TimeframeKey::D7), ts(60));
    assert!(view.coverage_note.is_some());
    assert_eq!(view.status, FeedStatus::Live);
}
