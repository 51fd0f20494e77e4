//! Pulsefeed reconciles two data paths into one dashboard-ready view.
//!
//! Overview
//! - Local path: an append-only store is seeded with a snapshot read, then
//!   kept current by a push subscription. The [`LocalStreamMerger`] owns the
//!   bounded buffer, deduplicates by timestamp, and pages backward on demand.
//! - Global path: a remote, rate-limited market service is polled through a
//!   fixed pipeline of backoff gate, TTL cache, and bounded fetch. The
//!   [`GlobalHydrator`] runs the three remote operations concurrently and
//!   publishes results only while they are still the newest request for the
//!   asset; stale and cancelled runs are discarded without a trace in the
//!   published view.
//! - Aggregation: [`aggregate`] and the view methods on [`PulseFeed`] are
//!   pure functions from a series and a timeframe to cards, a windowed slice,
//!   and a status line. Same inputs, same view.
//!
//! Failure posture: a failed or rate-limited refresh never blanks the
//! dashboard. Previously published data is retained and the status flips to
//! paused until a later refresh succeeds.
//!
//! Construction goes through the builder:
//! ```rust,ignore
//! let feed = PulseFeed::builder()
//!     .market(market)
//!     .local_store(store)
//!     .build()?;
//! let _ingest = feed.start_local_ingest().await?;
//! let view = feed.hydrate_global("grid-a").await;
//! ```
#![warn(missing_docs)]

mod aggregator;
mod feed;
mod hydrator;
mod merger;

pub use aggregator::{DashboardView, aggregate};
pub use feed::{PulseFeed, PulseFeedBuilder};
pub use hydrator::{GlobalHydrator, HydrationView};
pub use merger::{LocalStreamMerger, RowFilter};

pub use pulsefeed_core::{
    Card, FeedConfig, FeedError, FeedStatus, FetchOutcome, LocalStore, MarketService,
    MarketSnapshot, Point, ResolutionClass, Series, StoreRow, StreamHandle, Timeframe,
    TimeframeKey,
};
pub use pulsefeed_middleware::FeedServices;
