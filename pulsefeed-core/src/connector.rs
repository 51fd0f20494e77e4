use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use crate::stream::StreamHandle;
use crate::types::{MarketSnapshot, ResolutionClass, Series, StoreRow};
use crate::FeedError;

/// Tagged result of a Market Service operation.
///
/// The service boundary yields exactly three outcomes; callers must never
/// infer the condition from response shape or status-code branching. A
/// missing asset is indistinguishable from a transport failure at this
/// boundary and maps to [`FetchOutcome::Unavailable`].
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
    /// The operation succeeded.
    Ok(T),
    /// The source signalled overload; the caller must set a backoff cooldown.
    RateLimited,
    /// The source failed or the asset does not exist; no cooldown is set.
    Unavailable,
}

impl<T> FetchOutcome<T> {
    /// Successful payload, if any.
    pub fn ok(self) -> Option<T> {
        match self {
            Self::Ok(v) => Some(v),
            _ => None,
        }
    }

    /// True for the rate-limited outcome.
    #[must_use]
    pub const fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited)
    }

    /// Map the success payload, preserving the other outcomes.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> FetchOutcome<U> {
        match self {
            Self::Ok(v) => FetchOutcome::Ok(f(v)),
            Self::RateLimited => FetchOutcome::RateLimited,
            Self::Unavailable => FetchOutcome::Unavailable,
        }
    }

    /// Convert into a `Result`, tagging failures with the source key.
    ///
    /// # Errors
    /// `RateLimited` becomes `FeedError::RateLimited`, `Unavailable` becomes
    /// `FeedError::Unavailable`.
    pub fn into_result(self, source: &str) -> Result<T, FeedError> {
        match self {
            Self::Ok(v) => Ok(v),
            Self::RateLimited => Err(FeedError::rate_limited(source)),
            Self::Unavailable => Err(FeedError::unavailable(source)),
        }
    }
}

/// Remote, rate-limited market-data service, reachable only by polling.
///
/// Implementations sit behind a reverse proxy with its own HTTP-level caching
/// and are accessed exclusively through the hydrator, which layers the TTL
/// cache and the backoff gate in front of every call.
#[async_trait]
pub trait MarketService: Send + Sync {
    /// Fetch the current snapshot for an asset.
    async fn snapshot(&self, asset: &str) -> FetchOutcome<MarketSnapshot>;

    /// Fetch a chart series for an asset at the given resolution.
    async fn chart(&self, asset: &str, resolution: ResolutionClass) -> FetchOutcome<Series>;
}

/// Append-only local time-series store offering snapshot reads, backward
/// pagination, and a push subscription.
///
/// Push delivery is at-least-once with no ordering guarantee across
/// reconnects; the stream merger deduplicates by timestamp.
#[async_trait]
pub trait LocalStore: Send + Sync {
    /// Most recent rows, newest first.
    ///
    /// # Errors
    /// Returns `FeedError::Store` on a storage failure. Callers treat a
    /// failure on the initial snapshot as non-fatal.
    async fn snapshot(&self, limit: usize) -> Result<Vec<StoreRow>, FeedError>;

    /// Rows strictly older than `before`, newest first.
    ///
    /// # Errors
    /// Returns `FeedError::Store` on a storage failure.
    async fn older_than(
        &self,
        before: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<StoreRow>, FeedError>;

    /// Subscribe to newly inserted rows.
    ///
    /// Dropping or stopping the returned [`StreamHandle`] tears the
    /// subscription down.
    ///
    /// # Errors
    /// Returns `FeedError::Store` when the subscription cannot be
    /// established.
    async fn subscribe_inserts(
        &self,
    ) -> Result<(StreamHandle, mpsc::Receiver<StoreRow>), FeedError>;
}
