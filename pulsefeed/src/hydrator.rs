use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use pulsefeed_core::{
    FeedConfig, FeedStatus, FetchOutcome, MarketService, MarketSnapshot, ResolutionClass, Series,
};
use pulsefeed_middleware::FeedServices;
use tokio_util::sync::CancellationToken;

/// Outcome of one remote operation inside a hydration run.
enum OpOutcome<T> {
    Value(T),
    Paused,
    Failed,
}

impl<T> OpOutcome<T> {
    fn value(self) -> Option<T> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    const fn is_value(&self) -> bool {
        matches!(self, Self::Value(_))
    }
}

/// Everything the global path knows about one asset.
///
/// A view is only ever replaced wholesale by the hydration run that produced
/// it; partial failures keep the previous fields and flip the status.
#[derive(Debug, Clone, Default)]
pub struct HydrationView {
    /// Latest market snapshot, if any fetch has succeeded.
    pub snapshot: Option<MarketSnapshot>,
    /// Fine-grained recent chart.
    pub short_chart: Series,
    /// Coarse long-range chart.
    pub long_chart: Series,
    /// Feed health derived from the latest run.
    pub status: FeedStatus,
}

/// Refreshes remote assets through the backoff gate, the TTL cache, and a
/// bounded fetch, and publishes per-asset views.
///
/// Every run is stamped with a per-asset sequence number and carries a
/// cancellation token; starting a new run cancels the previous one. A run
/// whose number is no longer the latest when it completes publishes nothing.
pub struct GlobalHydrator {
    market: Arc<dyn MarketService>,
    services: Arc<FeedServices>,
    cfg: FeedConfig,
    published: Mutex<HashMap<String, HydrationView>>,
    inflight: Mutex<Option<CancellationToken>>,
}

impl GlobalHydrator {
    /// Create a hydrator over a market service and shared middleware state.
    #[must_use]
    pub fn new(
        market: Arc<dyn MarketService>,
        services: Arc<FeedServices>,
        cfg: FeedConfig,
    ) -> Self {
        Self {
            market,
            services,
            cfg,
            published: Mutex::new(HashMap::new()),
            inflight: Mutex::new(None),
        }
    }

    /// Refresh `asset` and return the view to display.
    ///
    /// The snapshot and both chart fetches run concurrently, each behind the
    /// backoff gate and its cache. When all three succeed the view goes
    /// Live; any rate-limit, failure, or timeout keeps the previously
    /// published data (if any) and goes Paused. A run that was superseded or
    /// cancelled while in flight returns the currently published view
    /// untouched.
    ///
    /// # Panics
    /// Panics if an internal mutex is poisoned.
    pub async fn hydrate(&self, asset: &str) -> HydrationView {
        let token = CancellationToken::new();
        {
            let mut inflight = self.inflight.lock().expect("mutex poisoned");
            if let Some(previous) = inflight.replace(token.clone()) {
                previous.cancel();
            }
        }
        let seq = self.services.next_sequence(asset);

        let (snapshot, short_chart, long_chart) = tokio::join!(
            self.fetch_snapshot(asset),
            self.fetch_chart(asset, ResolutionClass::Short),
            self.fetch_chart(asset, ResolutionClass::Long),
        );

        // Apply guard: only the newest, uncancelled run may publish.
        if token.is_cancelled() || self.services.current_sequence(asset) != seq {
            #[cfg(feature = "tracing")]
            tracing::debug!(asset, seq, "discarding superseded hydration run");
            return self.published(asset).unwrap_or_default();
        }

        // Any gated, failed, or timed-out operation pauses the feed; the
        // fields themselves fall back to what was published before.
        let complete =
            snapshot.is_value() && short_chart.is_value() && long_chart.is_value();
        let status = if complete {
            FeedStatus::Live
        } else {
            FeedStatus::Paused
        };

        let mut published = self.published.lock().expect("mutex poisoned");
        let previous = published.entry(asset.to_string()).or_default();
        let view = HydrationView {
            snapshot: snapshot.value().or_else(|| previous.snapshot.clone()),
            short_chart: short_chart
                .value()
                .unwrap_or_else(|| previous.short_chart.clone()),
            long_chart: long_chart
                .value()
                .unwrap_or_else(|| previous.long_chart.clone()),
            status,
        };
        *previous = view.clone();
        view
    }

    /// Most recently published view for `asset`, if any.
    ///
    /// # Panics
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn published(&self, asset: &str) -> Option<HydrationView> {
        let published = self.published.lock().expect("mutex poisoned");
        published.get(asset).cloned()
    }

    async fn fetch_snapshot(&self, asset: &str) -> OpOutcome<MarketSnapshot> {
        let key = format!("snap:{asset}");
        if self.services.backoff.is_backed_off(asset) {
            return OpOutcome::Paused;
        }
        if let Some(cached) = self.services.snapshots.get(&key, self.cfg.snapshot_ttl).await {
            return OpOutcome::Value(cached);
        }
        match self.bounded(self.market.snapshot(asset)).await {
            Some(FetchOutcome::Ok(snapshot)) => {
                self.services.snapshots.set(key, snapshot.clone()).await;
                OpOutcome::Value(snapshot)
            }
            Some(FetchOutcome::RateLimited) => {
                self.mark_limited(asset);
                OpOutcome::Paused
            }
            Some(FetchOutcome::Unavailable) | None => OpOutcome::Failed,
        }
    }

    async fn fetch_chart(&self, asset: &str, resolution: ResolutionClass) -> OpOutcome<Series> {
        let key = format!("chart:{asset}:{}", resolution.as_str());
        if self.services.backoff.is_backed_off(asset) {
            return OpOutcome::Paused;
        }
        if let Some(cached) = self.services.charts.get(&key, self.cfg.chart_ttl).await {
            return OpOutcome::Value(cached);
        }
        match self.bounded(self.market.chart(asset, resolution)).await {
            Some(FetchOutcome::Ok(series)) => {
                self.services.charts.set(key, series.clone()).await;
                OpOutcome::Value(series)
            }
            Some(FetchOutcome::RateLimited) => {
                self.mark_limited(asset);
                OpOutcome::Paused
            }
            Some(FetchOutcome::Unavailable) | None => OpOutcome::Failed,
        }
    }

    // Timeout expiry counts as failure, never as rate limiting.
    async fn bounded<T>(
        &self,
        fut: impl core::future::Future<Output = FetchOutcome<T>>,
    ) -> Option<FetchOutcome<T>> {
        tokio::time::timeout(self.cfg.request_timeout, fut).await.ok()
    }

    fn mark_limited(&self, asset: &str) {
        #[cfg(feature = "tracing")]
        tracing::warn!(asset, "source rate limited, entering cooldown");
        self.services
            .backoff
            .mark_limited(asset, self.cfg.backoff_cooldown);
    }
}
