use std::sync::Arc;
use std::time::Duration;

use pulsefeed::{
    FeedConfig, FeedServices, FeedStatus, FetchOutcome, GlobalHydrator, MarketService,
    ResolutionClass,
};
use pulsefeed_mock::{MockMarketService, series_fixture, snapshot_fixture};

fn hydrator_with(market: Arc<MockMarketService>, cfg: FeedConfig) -> GlobalHydrator {
    GlobalHydrator::new(
        market as Arc<dyn MarketService>,
        Arc::new(FeedServices::new()),
        cfg,
    )
}

fn market_with_defaults() -> Arc<MockMarketService> {
    let market = Arc::new(MockMarketService::new());
    market.set_default_snapshot(snapshot_fixture(42.0));
    market.set_default_chart(ResolutionClass::Short, series_fixture(&[(0, 40.0), (60, 42.0)]));
    market.set_default_chart(ResolutionClass::Long, series_fixture(&[(0, 30.0), (86_400, 42.0)]));
    market
}

fn uncached() -> FeedConfig {
    FeedConfig {
        snapshot_ttl: Duration::ZERO,
        chart_ttl: Duration::ZERO,
        ..FeedConfig::default()
    }
}

#[tokio::test]
async fn successful_run_publishes_live_view() {
    let market = market_with_defaults();
    let hydrator = hydrator_with(market.clone(), FeedConfig::default());

    let view = hydrator.hydrate("grid-a").await;
    assert_eq!(view.status, FeedStatus::Live);
    assert_eq!(view.snapshot.unwrap().current_value, 42.0);
    assert_eq!(view.short_chart.len(), 2);
    assert_eq!(view.long_chart.len(), 2);
    assert_eq!(market.total_calls(), 3);
}

#[tokio::test]
async fn fresh_cache_skips_the_network() {
    let market = market_with_defaults();
    let hydrator = hydrator_with(market.clone(), FeedConfig::default());

    hydrator.hydrate("grid-a").await;
    let view = hydrator.hydrate("grid-a").await;
    assert_eq!(view.status, FeedStatus::Live);
    assert_eq!(market.total_calls(), 3, "second run served from cache");
}

#[tokio::test]
async fn rate_limit_pauses_and_gates_later_runs() {
    let market = market_with_defaults();
    market.script_snapshot(FetchOutcome::RateLimited);
    let hydrator = hydrator_with(market.clone(), uncached());

    let view = hydrator.hydrate("grid-a").await;
    assert_eq!(view.status, FeedStatus::Paused);

    // During the cooldown the whole asset is gated: zero network calls.
    let calls = market.total_calls();
    let view = hydrator.hydrate("grid-a").await;
    assert_eq!(view.status, FeedStatus::Paused);
    assert_eq!(market.total_calls(), calls);
}

#[tokio::test]
async fn failure_retains_previously_published_data() {
    let market = market_with_defaults();
    let hydrator = hydrator_with(market.clone(), uncached());

    let first = hydrator.hydrate("grid-a").await;
    assert_eq!(first.status, FeedStatus::Live);

    market.script_snapshot(FetchOutcome::Unavailable);
    market.script_chart(FetchOutcome::Unavailable);
    market.script_chart(FetchOutcome::Unavailable);
    let second = hydrator.hydrate("grid-a").await;
    assert_eq!(second.status, FeedStatus::Paused);
    assert_eq!(second.snapshot.unwrap().current_value, 42.0);
    assert_eq!(second.short_chart, first.short_chart);
    assert_eq!(second.long_chart, first.long_chart);
}

#[tokio::test]
async fn all_failed_with_nothing_published_pauses() {
    // No scripts and no defaults: every operation comes back unavailable.
    let market = Arc::new(MockMarketService::new());
    let hydrator = hydrator_with(market, uncached());

    let view = hydrator.hydrate("grid-a").await;
    assert_eq!(view.status, FeedStatus::Paused);
    assert!(view.snapshot.is_none());
    assert!(view.short_chart.is_empty());
    assert!(view.long_chart.is_empty());
}

#[tokio::test(start_paused = true)]
async fn timed_out_fetch_counts_as_failure_not_rate_limit() {
    let market = market_with_defaults();
    market.script_snapshot_after(Duration::from_secs(30), FetchOutcome::Ok(snapshot_fixture(1.0)));
    let cfg = FeedConfig {
        request_timeout: Duration::from_secs(1),
        ..uncached()
    };
    let hydrator = hydrator_with(market.clone(), cfg);

    let view = hydrator.hydrate("grid-a").await;
    assert_eq!(view.status, FeedStatus::Paused);
    assert!(view.snapshot.is_none());

    // No cooldown was set, so the next run goes back to the network.
    let calls = market.total_calls();
    hydrator.hydrate("grid-a").await;
    assert!(market.total_calls() > calls);
}

#[tokio::test(start_paused = true)]
async fn superseded_run_never_overwrites_newer_data() {
    let market = market_with_defaults();
    // The first run's responses arrive late; the second run's immediately.
    let slow = Duration::from_millis(500);
    market.script_snapshot_after(slow, FetchOutcome::Ok(snapshot_fixture(1.0)));
    market.script_chart_after(slow, FetchOutcome::Ok(series_fixture(&[(0, 1.0)])));
    market.script_chart_after(slow, FetchOutcome::Ok(series_fixture(&[(0, 1.0)])));
    market.script_snapshot(FetchOutcome::Ok(snapshot_fixture(2.0)));
    market.script_chart(FetchOutcome::Ok(series_fixture(&[(0, 2.0)])));
    market.script_chart(FetchOutcome::Ok(series_fixture(&[(0, 2.0)])));

    let hydrator = Arc::new(hydrator_with(market, uncached()));
    let first = {
        let hydrator = Arc::clone(&hydrator);
        tokio::spawn(async move { hydrator.hydrate("grid-a").await })
    };
    // Let the first run pop its scripted responses before starting the second.
    tokio::time::sleep(Duration::from_millis(10)).await;
    let second = hydrator.hydrate("grid-a").await;
    assert_eq!(second.snapshot.as_ref().unwrap().current_value, 2.0);

    let first = first.await.unwrap();
    // The late run reports the published view, not its own stale payload.
    assert_eq!(first.snapshot.as_ref().unwrap().current_value, 2.0);
    let published = hydrator.published("grid-a").unwrap();
    assert_eq!(published.snapshot.unwrap().current_value, 2.0);
    assert_eq!(published.short_chart, series_fixture(&[(0, 2.0)]));
}
