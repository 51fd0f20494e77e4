use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use pulsefeed_core::{
    FeedConfig, FeedError, LocalStore, MarketService, ResolutionClass, StreamHandle, Timeframe,
    build_cards, slice_window,
};
use pulsefeed_middleware::FeedServices;

use crate::aggregator::{DashboardView, aggregate};
use crate::hydrator::{GlobalHydrator, HydrationView};
use crate::merger::{LocalStreamMerger, RowFilter};

/// Reconciliation engine tying the local and global paths together.
///
/// One instance serves one dashboard: the local path tracks the append-only
/// store through the [`LocalStreamMerger`], the global path refreshes remote
/// assets through the [`GlobalHydrator`], and the view methods project either
/// path into a [`DashboardView`].
pub struct PulseFeed {
    merger: Arc<LocalStreamMerger>,
    hydrator: GlobalHydrator,
    cfg: FeedConfig,
}

/// Builder for constructing a [`PulseFeed`] engine.
pub struct PulseFeedBuilder {
    market: Option<Arc<dyn MarketService>>,
    local_store: Option<Arc<dyn LocalStore>>,
    services: Option<Arc<FeedServices>>,
    local_filter: Option<Arc<RowFilter>>,
    cfg: FeedConfig,
}

impl Default for PulseFeedBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PulseFeedBuilder {
    /// Create a builder with default configuration and no collaborators.
    #[must_use]
    pub fn new() -> Self {
        Self {
            market: None,
            local_store: None,
            services: None,
            local_filter: None,
            cfg: FeedConfig::default(),
        }
    }

    /// Set the remote market service. Required.
    #[must_use]
    pub fn market(mut self, market: Arc<dyn MarketService>) -> Self {
        self.market = Some(market);
        self
    }

    /// Set the local store. Required.
    #[must_use]
    pub fn local_store(mut self, store: Arc<dyn LocalStore>) -> Self {
        self.local_store = Some(store);
        self
    }

    /// Supply shared middleware state. Useful when several engines should
    /// share one backoff tracker and cache; by default each engine gets its
    /// own.
    #[must_use]
    pub fn services(mut self, services: Arc<FeedServices>) -> Self {
        self.services = Some(services);
        self
    }

    /// Restrict local ingestion to rows passing `filter`, e.g. rows for one
    /// asset. By default every row is ingested.
    #[must_use]
    pub fn local_filter(mut self, filter: Arc<RowFilter>) -> Self {
        self.local_filter = Some(filter);
        self
    }

    /// Override the default configuration.
    #[must_use]
    pub fn config(mut self, cfg: FeedConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Build the engine.
    ///
    /// # Errors
    /// Returns `FeedError::Config` when the market service or the local
    /// store is missing, or when `buffer_cap` is zero.
    pub fn build(self) -> Result<PulseFeed, FeedError> {
        let market = self.market.ok_or_else(|| {
            FeedError::Config("no market service; set one via market(...)".to_string())
        })?;
        let store = self.local_store.ok_or_else(|| {
            FeedError::Config("no local store; set one via local_store(...)".to_string())
        })?;
        if self.cfg.buffer_cap == 0 {
            return Err(FeedError::Config("buffer_cap must be nonzero".to_string()));
        }
        let services = self.services.unwrap_or_default();
        let merger = match self.local_filter {
            Some(filter) => Arc::new(LocalStreamMerger::with_filter(
                store,
                self.cfg.buffer_cap,
                filter,
            )),
            None => Arc::new(LocalStreamMerger::new(store, self.cfg.buffer_cap)),
        };
        let hydrator = GlobalHydrator::new(market, services, self.cfg.clone());
        Ok(PulseFeed {
            merger,
            hydrator,
            cfg: self.cfg,
        })
    }
}

impl PulseFeed {
    /// Start building an engine.
    #[must_use]
    pub fn builder() -> PulseFeedBuilder {
        PulseFeedBuilder::new()
    }

    /// Seed the local buffer and start the push subscription.
    ///
    /// A failed seed read is non-fatal: the buffer starts empty and fills
    /// from push events. Keep the returned handle alive for as long as live
    /// updates should flow.
    ///
    /// # Errors
    /// Returns `FeedError::Store` when the subscription itself cannot be
    /// established.
    pub async fn start_local_ingest(&self) -> Result<StreamHandle, FeedError> {
        if let Err(_e) = self
            .merger
            .load_snapshot(self.cfg.initial_snapshot_rows)
            .await
        {
            #[cfg(feature = "tracing")]
            tracing::warn!(error = %_e, "local seed read failed, starting empty");
        }
        self.merger.spawn_ingest().await
    }

    /// Refresh a remote asset and return its published view.
    pub async fn hydrate_global(&self, asset: &str) -> HydrationView {
        self.hydrator.hydrate(asset).await
    }

    /// Most recently published global view for `asset`, without refreshing.
    #[must_use]
    pub fn published_global(&self, asset: &str) -> Option<HydrationView> {
        self.hydrator.published(asset)
    }

    /// Project the local buffer into a dashboard view.
    #[must_use]
    pub fn local_view(&self, timeframe: Timeframe, end_ts: DateTime<Utc>) -> DashboardView {
        aggregate(&self.merger.series(), timeframe, end_ts)
    }

    /// Project the published global view for `asset` into a dashboard view.
    ///
    /// Cards for short timeframes come from the fine-grained chart, cards
    /// for long timeframes from the coarse one, and the visible slice from
    /// whichever backs the selected timeframe. The headline value prefers
    /// the market snapshot over the chart tail. Without any published data
    /// the view is syncing and empty.
    #[must_use]
    pub fn global_view(
        &self,
        asset: &str,
        timeframe: Timeframe,
        end_ts: DateTime<Utc>,
    ) -> DashboardView {
        let view = self.hydrator.published(asset).unwrap_or_default();
        let series_for = |resolution: ResolutionClass| match resolution {
            ResolutionClass::Short => &view.short_chart,
            ResolutionClass::Long => &view.long_chart,
        };

        let mut cards = BTreeMap::new();
        for class in [ResolutionClass::Short, ResolutionClass::Long] {
            let tfs: Vec<Timeframe> = Timeframe::all()
                .iter()
                .copied()
                .filter(|tf| tf.resolution == class)
                .collect();
            cards.append(&mut build_cards(series_for(class), end_ts, &tfs));
        }

        let selected = series_for(timeframe.resolution);
        let (visible_slice, _) = slice_window(selected, end_ts, timeframe.window());
        let coverage_note = cards
            .get(&timeframe.key)
            .and_then(|c| c.coverage_note.clone());
        let current_value = view
            .snapshot
            .as_ref()
            .map(|s| s.current_value)
            .or_else(|| selected.last().map(|p| p.val));

        DashboardView {
            current_value,
            cards,
            visible_slice,
            coverage_note,
            status: view.status,
        }
    }

    /// Load one backward page of older local rows.
    ///
    /// # Errors
    /// Returns `FeedError::Store` when the read fails.
    pub async fn load_older(&self) -> Result<usize, FeedError> {
        self.merger.load_older(self.cfg.page_size).await
    }

    /// Direct access to the local merger, mainly for tests and host glue.
    #[must_use]
    pub fn merger(&self) -> &Arc<LocalStreamMerger> {
        &self.merger
    }

    /// Polling cadence the host should use for global refreshes.
    #[must_use]
    pub fn refresh_interval(&self) -> Duration {
        self.cfg.refresh_interval
    }
}
