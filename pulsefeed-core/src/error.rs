use thiserror::Error;

/// Unified error type for the pulsefeed workspace.
///
/// Network-boundary failures (`RateLimited`, `Unavailable`) are caught inside
/// the hydrator and converted into status flags; they never propagate to the
/// aggregator or the display layer. `Parse` and `Stale` describe inputs that
/// are dropped silently and only surface through logs.
#[derive(Debug, Error)]
pub enum FeedError {
    /// A raw store row failed to normalize into a point.
    #[error("malformed row: {what}")]
    Parse {
        /// Description of the field that failed to parse.
        what: String,
    },

    /// The series has no points yet. A valid terminal state ("syncing"),
    /// not a hard failure.
    #[error("series has no points")]
    EmptySeries,

    /// The remote source signalled overload (HTTP 429 or equivalent).
    /// Recoverable; triggers a backoff cooldown.
    #[error("rate limited by {key}")]
    RateLimited {
        /// Source key that signalled the limit.
        key: String,
    },

    /// Network or transport failure. Treated like `RateLimited` for status
    /// purposes but does not set a cooldown.
    #[error("source unavailable: {key}")]
    Unavailable {
        /// Source key that could not be reached.
        key: String,
    },

    /// A response arrived for a superseded request and was discarded.
    #[error("stale response: sequence {got}, latest {latest}")]
    Stale {
        /// Sequence number carried by the late response.
        got: u64,
        /// Most recently issued sequence number for the source.
        latest: u64,
    },

    /// The local store failed. Non-fatal on the initial snapshot; the engine
    /// proceeds with an empty series and waits for push events.
    #[error("local store failed: {msg}")]
    Store {
        /// Human-readable failure message from the store.
        msg: String,
    },

    /// Invalid engine configuration or builder input.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl FeedError {
    /// Helper: build a `Parse` error for a field description.
    pub fn parse(what: impl Into<String>) -> Self {
        Self::Parse { what: what.into() }
    }

    /// Helper: build a `RateLimited` error for a source key.
    pub fn rate_limited(key: impl Into<String>) -> Self {
        Self::RateLimited { key: key.into() }
    }

    /// Helper: build an `Unavailable` error for a source key.
    pub fn unavailable(key: impl Into<String>) -> Self {
        Self::Unavailable { key: key.into() }
    }

    /// Helper: build a `Store` error with a failure message.
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store { msg: msg.into() }
    }

    /// True when the error describes a recoverable source condition rather
    /// than bad data.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::Unavailable { .. } | Self::Stale { .. }
        )
    }
}
