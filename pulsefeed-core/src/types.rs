//! Common data structures shared across the pulsefeed workspace.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::FeedError;

/// One observation in a value series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Observation instant.
    pub ts: DateTime<Utc>,
    /// Observed value. Always finite inside a [`Series`].
    pub val: f64,
}

impl Point {
    /// Construct a point from an instant and a value.
    #[must_use]
    pub const fn new(ts: DateTime<Utc>, val: f64) -> Self {
        Self { ts, val }
    }
}

/// Ordered sequence of [`Point`]s, strictly ascending by timestamp with no
/// duplicate timestamps and no non-finite values.
///
/// Series are rebuilt rather than mutated in place: the component that last
/// produced one owns it, and consumers receive clones.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    points: Vec<Point>,
}

impl Series {
    /// An empty series.
    #[must_use]
    pub const fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Build a series from arbitrary points, restoring the invariants:
    /// non-finite values are dropped, points are sorted ascending, and on
    /// duplicate timestamps the first occurrence wins.
    ///
    /// A collection of only non-finite values therefore normalizes to an
    /// empty series.
    #[must_use]
    pub fn from_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = Point>,
    {
        let mut keyed: BTreeMap<DateTime<Utc>, f64> = BTreeMap::new();
        for p in points {
            if p.val.is_finite() {
                keyed.entry(p.ts).or_insert(p.val);
            }
        }
        Self {
            points: keyed.into_iter().map(|(ts, val)| Point { ts, val }).collect(),
        }
    }

    /// Wrap points that are already ascending, deduplicated, and finite.
    ///
    /// Intended for producers that maintain the invariants themselves (the
    /// stream merger's buffer, window slices). Debug builds assert ordering.
    #[must_use]
    pub fn from_ordered(points: Vec<Point>) -> Self {
        debug_assert!(points.windows(2).all(|w| w[0].ts < w[1].ts));
        debug_assert!(points.iter().all(|p| p.val.is_finite()));
        Self { points }
    }

    /// Borrow the underlying points.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Consume the series, returning its points.
    #[must_use]
    pub fn into_points(self) -> Vec<Point> {
        self.points
    }

    /// First (earliest) point, if any.
    #[must_use]
    pub fn first(&self) -> Option<&Point> {
        self.points.first()
    }

    /// Last (most recent) point, if any.
    #[must_use]
    pub fn last(&self) -> Option<&Point> {
        self.points.last()
    }

    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when the series holds no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Lookback bucket identifier. The set is fixed; every dashboard card maps to
/// exactly one key.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum TimeframeKey {
    /// 1 hour.
    H1,
    /// 24 hours.
    H24,
    /// 7 days.
    D7,
    /// 30 days.
    D30,
    /// 3 months (90 days).
    M3,
    /// 6 months (180 days).
    M6,
    /// 1 year (365 days).
    Y1,
}

impl TimeframeKey {
    /// Short display label, e.g. `"24H"`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::H1 => "1H",
            Self::H24 => "24H",
            Self::D7 => "7D",
            Self::D30 => "30D",
            Self::M3 => "3M",
            Self::M6 => "6M",
            Self::Y1 => "1Y",
        }
    }
}

impl fmt::Display for TimeframeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which of the two chart series backs a timeframe's computation:
/// fine-grained recent data or coarse long-range data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResolutionClass {
    /// Fine-grained series covering the recent past.
    Short,
    /// Coarse series covering the long range.
    Long,
}

impl ResolutionClass {
    /// Stable label used in cache keys.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Short => "short",
            Self::Long => "long",
        }
    }
}

/// A lookback window paired with the chart resolution that backs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeframe {
    /// Bucket identifier.
    pub key: TimeframeKey,
    /// Chart series class backing this timeframe.
    pub resolution: ResolutionClass,
}

impl Timeframe {
    /// The fixed, ordered set of supported timeframes.
    pub const ALL: [Self; 7] = [
        Self { key: TimeframeKey::H1, resolution: ResolutionClass::Short },
        Self { key: TimeframeKey::H24, resolution: ResolutionClass::Short },
        Self { key: TimeframeKey::D7, resolution: ResolutionClass::Long },
        Self { key: TimeframeKey::D30, resolution: ResolutionClass::Long },
        Self { key: TimeframeKey::M3, resolution: ResolutionClass::Long },
        Self { key: TimeframeKey::M6, resolution: ResolutionClass::Long },
        Self { key: TimeframeKey::Y1, resolution: ResolutionClass::Long },
    ];

    /// All supported timeframes in display order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &Self::ALL
    }

    /// Look up the timeframe for a key.
    #[must_use]
    pub fn by_key(key: TimeframeKey) -> Self {
        // ALL covers every key variant.
        Self::ALL
            .into_iter()
            .find(|tf| tf.key == key)
            .unwrap_or(Self::ALL[0])
    }

    /// Window length of this timeframe.
    #[must_use]
    pub fn window(&self) -> Duration {
        match self.key {
            TimeframeKey::H1 => Duration::hours(1),
            TimeframeKey::H24 => Duration::hours(24),
            TimeframeKey::D7 => Duration::days(7),
            TimeframeKey::D30 => Duration::days(30),
            TimeframeKey::M3 => Duration::days(90),
            TimeframeKey::M6 => Duration::days(180),
            TimeframeKey::Y1 => Duration::days(365),
        }
    }
}

/// Per-timeframe derived metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    /// Percentage change over the timeframe window. Never NaN or infinite.
    pub change_pct: f64,
    /// Set when the series does not reach back far enough to cover the
    /// requested window.
    pub coverage_note: Option<String>,
}

/// Point-in-time market snapshot for a remote asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Current traded value.
    pub current_value: f64,
    /// 24-hour high, when the source reports one.
    pub high_24h: Option<f64>,
    /// 24-hour low, when the source reports one.
    pub low_24h: Option<f64>,
    /// 24-hour volume, when the source reports one.
    pub volume: Option<f64>,
    /// Market capitalization, when the source reports one.
    pub market_cap: Option<f64>,
    /// Instant the source last updated this snapshot.
    pub updated_at: DateTime<Utc>,
}

/// Raw row as delivered by the Local Store, before normalization.
///
/// The store persists value and timestamp as text; [`StoreRow::normalize`]
/// parses both and rejects anything that is not a finite number at a valid
/// instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreRow {
    /// Asset label the row belongs to.
    pub asset: String,
    /// Insertion instant, RFC 3339.
    pub recorded_at: String,
    /// Observed value, decimal text.
    pub value: String,
}

impl StoreRow {
    /// Construct a raw row.
    pub fn new(
        asset: impl Into<String>,
        recorded_at: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            asset: asset.into(),
            recorded_at: recorded_at.into(),
            value: value.into(),
        }
    }

    /// Parse this row into a [`Point`].
    ///
    /// # Errors
    /// Returns `FeedError::Parse` when the timestamp is not RFC 3339 or the
    /// value is not a finite decimal number. Callers drop such rows and may
    /// log them.
    pub fn normalize(&self) -> Result<Point, FeedError> {
        let ts = DateTime::parse_from_rfc3339(&self.recorded_at)
            .map_err(|e| FeedError::parse(format!("recorded_at {:?}: {e}", self.recorded_at)))?
            .with_timezone(&Utc);
        let val: f64 = self
            .value
            .parse()
            .map_err(|_| FeedError::parse(format!("value {:?}", self.value)))?;
        if !val.is_finite() {
            return Err(FeedError::parse(format!("non-finite value {:?}", self.value)));
        }
        Ok(Point { ts, val })
    }
}

/// Coarse feed health for display purposes.
///
/// Transport failures and rate limits collapse into `Paused`; an empty series
/// is `Syncing`, not an error. Recovery is automatic, so no variant carries a
/// user-actionable payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedStatus {
    /// Data is current and flowing.
    Live,
    /// No data observed yet for this selection.
    #[default]
    Syncing,
    /// The source is backed off or failing; previously displayed data is
    /// retained while the engine retries.
    Paused,
}

impl FeedStatus {
    /// Single user-visible status line.
    #[must_use]
    pub const fn status_text(self) -> &'static str {
        match self {
            Self::Live => "Live",
            Self::Syncing => "Syncing...",
            Self::Paused => "Live Feed Paused - Retrying",
        }
    }
}
