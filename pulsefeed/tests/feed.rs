use std::sync::Arc;
use std::time::Duration;

use chrono::DateTime;
use pulsefeed::{
    FeedConfig, FeedError, FeedStatus, LocalStore, MarketService, PulseFeed, ResolutionClass,
    StoreRow, Timeframe, TimeframeKey,
};
use pulsefeed_mock::{
    MockLocalStore, MockMarketService, row_fixture, series_fixture, snapshot_fixture,
};

fn collaborators() -> (Arc<MockMarketService>, Arc<MockLocalStore>) {
    let market = Arc::new(MockMarketService::new());
    market.set_default_snapshot(snapshot_fixture(42.0));
    // The fine chart only covers the last five minutes before day 400; the
    // coarse chart reaches back to the epoch.
    market.set_default_chart(
        ResolutionClass::Short,
        series_fixture(&[(86_400 * 400 - 300, 40.0), (86_400 * 400, 44.0)]),
    );
    market.set_default_chart(
        ResolutionClass::Long,
        series_fixture(&[(0, 30.0), (86_400 * 400, 42.0)]),
    );
    (market, Arc::new(MockLocalStore::new()))
}

#[test]
fn build_requires_both_collaborators() {
    let (market, store) = collaborators();

    let built = PulseFeed::builder()
        .local_store(store.clone() as Arc<dyn LocalStore>)
        .build();
    assert!(matches!(built, Err(FeedError::Config(_))));

    let built = PulseFeed::builder()
        .market(market.clone() as Arc<dyn MarketService>)
        .build();
    assert!(matches!(built, Err(FeedError::Config(_))));

    assert!(
        PulseFeed::builder()
            .market(market as Arc<dyn MarketService>)
            .local_store(store as Arc<dyn LocalStore>)
            .build()
            .is_ok()
    );
}

#[test]
fn build_rejects_zero_buffer_cap() {
    let (market, store) = collaborators();
    let built = PulseFeed::builder()
        .market(market as Arc<dyn MarketService>)
        .local_store(store as Arc<dyn LocalStore>)
        .config(FeedConfig {
            buffer_cap: 0,
            ..FeedConfig::default()
        })
        .build();
    assert!(matches!(built, Err(FeedError::Config(_))));
}

#[tokio::test]
async fn local_path_end_to_end() {
    let (market, _) = collaborators();
    let rows: Vec<StoreRow> = (0..4)
        .map(|i| row_fixture("grid-a", i * 60, 100.0 + i as f64))
        .collect();
    let store = Arc::new(MockLocalStore::with_rows(rows).await);
    let feed = PulseFeed::builder()
        .market(market as Arc<dyn MarketService>)
        .local_store(store.clone() as Arc<dyn LocalStore>)
        .build()
        .unwrap();

    let handle = feed.start_local_ingest().await.unwrap();
    store.push(row_fixture("grid-a", 240, 104.5)).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    let end = DateTime::from_timestamp(240, 0).unwrap();
    let view = feed.local_view(Timeframe::by_key(TimeframeKey::H1), end);
    assert_eq!(view.status, FeedStatus::Live);
    assert_eq!(view.current_value, Some(104.5));
    assert_eq!(view.visible_slice.len(), 5);
    handle.stop().await;
}

#[tokio::test]
async fn seed_failure_is_nonfatal() {
    let (market, _) = collaborators();
    let store = Arc::new(MockLocalStore::new());
    let feed = PulseFeed::builder()
        .market(market as Arc<dyn MarketService>)
        .local_store(store.clone() as Arc<dyn LocalStore>)
        .build()
        .unwrap();

    store.set_fail_reads(true);
    let handle = feed.start_local_ingest().await.unwrap();
    assert!(feed.merger().is_empty());
    store.push(row_fixture("grid-a", 0, 1.0)).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(feed.merger().len(), 1);
    handle.stop().await;
}

#[tokio::test]
async fn global_view_routes_cards_by_resolution() {
    let (market, store) = collaborators();
    let feed = PulseFeed::builder()
        .market(market as Arc<dyn MarketService>)
        .local_store(store as Arc<dyn LocalStore>)
        .build()
        .unwrap();

    let view = feed.hydrate_global("grid-a").await;
    assert_eq!(view.status, FeedStatus::Live);

    let end = DateTime::from_timestamp(86_400 * 400, 0).unwrap();
    let dashboard = feed.global_view("grid-a", Timeframe::by_key(TimeframeKey::Y1), end);

    // Headline prefers the snapshot over the chart tail.
    assert_eq!(dashboard.current_value, Some(42.0));
    assert_eq!(dashboard.status, FeedStatus::Live);
    // Long timeframes measure against the coarse chart, which is fully
    // covered here; short ones against the fine chart, which is not.
    assert!(dashboard.cards[&TimeframeKey::Y1].coverage_note.is_none());
    assert!(dashboard.cards[&TimeframeKey::H1].coverage_note.is_some());
    assert!(!dashboard.visible_slice.is_empty());
}

#[tokio::test]
async fn global_view_without_hydration_is_syncing() {
    let (market, store) = collaborators();
    let feed = PulseFeed::builder()
        .market(market as Arc<dyn MarketService>)
        .local_store(store as Arc<dyn LocalStore>)
        .build()
        .unwrap();

    let end = DateTime::from_timestamp(0, 0).unwrap();
    let view = feed.global_view("grid-a", Timeframe::by_key(TimeframeKey::H24), end);
    assert_eq!(view.status, FeedStatus::Syncing);
    assert!(view.cards.is_empty());
    assert!(view.current_value.is_none());
}

#[tokio::test]
async fn load_older_pages_backward() {
    let (market, _) = collaborators();
    let rows: Vec<StoreRow> = (0..10).map(|i| row_fixture("grid-a", i * 60, i as f64)).collect();
    let store = Arc::new(MockLocalStore::with_rows(rows).await);
    let feed = PulseFeed::builder()
        .market(market as Arc<dyn MarketService>)
        .local_store(store as Arc<dyn LocalStore>)
        .config(FeedConfig {
            initial_snapshot_rows: 4,
            page_size: 3,
            ..FeedConfig::default()
        })
        .build()
        .unwrap();

    let handle = feed.start_local_ingest().await.unwrap();
    assert_eq!(feed.merger().len(), 4);
    let added = feed.load_older().await.unwrap();
    assert_eq!(added, 3);
    assert_eq!(feed.merger().len(), 7);
    handle.stop().await;
}
