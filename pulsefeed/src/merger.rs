use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use pulsefeed_core::{FeedError, LocalStore, Point, Series, StoreRow, StreamHandle};
use tokio::sync::oneshot;

/// Row predicate applied before any parsing. Rows it rejects never touch the
/// buffer.
pub type RowFilter = dyn Fn(&StoreRow) -> bool + Send + Sync;

/// Maintains the local series: a bounded, strictly ascending buffer fed by a
/// snapshot read, live push events, and backward pagination.
///
/// Push delivery is at-least-once and unordered across reconnects, so every
/// pushed row passes a strictly-newer gate against the buffer tail;
/// duplicates and regressions are dropped silently. The buffer never exceeds
/// its cap: the oldest points are shed first.
pub struct LocalStreamMerger {
    store: Arc<dyn LocalStore>,
    cap: usize,
    filter: Arc<RowFilter>,
    buffer: Mutex<Vec<Point>>,
}

impl LocalStreamMerger {
    /// Create a merger that accepts every row.
    #[must_use]
    pub fn new(store: Arc<dyn LocalStore>, cap: usize) -> Self {
        Self::with_filter(store, cap, Arc::new(|_| true))
    }

    /// Create a merger that only ingests rows passing `filter`, e.g. rows
    /// belonging to one asset.
    #[must_use]
    pub fn with_filter(store: Arc<dyn LocalStore>, cap: usize, filter: Arc<RowFilter>) -> Self {
        Self {
            store,
            cap,
            filter,
            buffer: Mutex::new(Vec::new()),
        }
    }

    /// Seed the buffer from a snapshot read, replacing any previous contents.
    ///
    /// Rows that fail the filter or do not normalize are dropped. Returns the
    /// number of points loaded.
    ///
    /// # Errors
    /// Returns `FeedError::Store` when the read fails. Callers may treat this
    /// as non-fatal and continue with an empty buffer.
    ///
    /// # Panics
    /// Panics if the internal mutex is poisoned.
    pub async fn load_snapshot(&self, limit: usize) -> Result<usize, FeedError> {
        let rows = self.store.snapshot(limit).await?;
        let series = self.normalize_rows(&rows);
        let mut points = series.into_points();
        if points.len() > self.cap {
            points.drain(..points.len() - self.cap);
        }
        let count = points.len();
        *self.buffer.lock().expect("mutex poisoned") = points;
        Ok(count)
    }

    /// Ingest one pushed row.
    ///
    /// Returns `true` when the row was appended. Rows rejected by the filter,
    /// rows that fail to normalize, and rows not strictly newer than the
    /// buffer tail return `false`.
    ///
    /// # Panics
    /// Panics if the internal mutex is poisoned.
    pub fn apply_push(&self, row: &StoreRow) -> bool {
        if !(self.filter)(row) {
            return false;
        }
        let point = match row.normalize() {
            Ok(p) => p,
            Err(_e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %_e, "dropping malformed pushed row");
                return false;
            }
        };
        let mut buffer = self.buffer.lock().expect("mutex poisoned");
        if let Some(last) = buffer.last()
            && point.ts <= last.ts
        {
            return false;
        }
        buffer.push(point);
        if buffer.len() > self.cap {
            let excess = buffer.len() - self.cap;
            buffer.drain(..excess);
        }
        true
    }

    /// Load one page of rows older than the buffer's earliest point and
    /// prepend them.
    ///
    /// A no-op on an empty buffer; there is no point to page back from.
    /// Returns the number of points added; the cap still holds afterward, so
    /// a buffer already at capacity sheds the oldest points again.
    ///
    /// # Errors
    /// Returns `FeedError::Store` when the read fails.
    ///
    /// # Panics
    /// Panics if the internal mutex is poisoned.
    pub async fn load_older(&self, limit: usize) -> Result<usize, FeedError> {
        let Some(before) = self.earliest_ts() else {
            return Ok(0);
        };
        let rows = self.store.older_than(before, limit).await?;
        let older = self.normalize_rows(&rows);

        let mut buffer = self.buffer.lock().expect("mutex poisoned");
        let mut merged: Vec<Point> = older
            .into_points()
            .into_iter()
            .filter(|p| p.ts < before)
            .collect();
        let added = merged.len();
        merged.extend(buffer.iter().copied());
        if merged.len() > self.cap {
            let excess = merged.len() - self.cap;
            merged.drain(..excess);
        }
        *buffer = merged;
        Ok(added)
    }

    /// Current buffer contents as an ordered series.
    ///
    /// # Panics
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn series(&self) -> Series {
        let buffer = self.buffer.lock().expect("mutex poisoned");
        Series::from_ordered(buffer.clone())
    }

    /// Timestamp of the earliest buffered point, if any.
    ///
    /// # Panics
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn earliest_ts(&self) -> Option<DateTime<Utc>> {
        let buffer = self.buffer.lock().expect("mutex poisoned");
        buffer.first().map(|p| p.ts)
    }

    /// Number of buffered points.
    ///
    /// # Panics
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.lock().expect("mutex poisoned").len()
    }

    /// True when the buffer holds no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Subscribe to store inserts and feed them through [`apply_push`] until
    /// stopped.
    ///
    /// The returned handle owns both the forwarding task and the store-side
    /// subscription; stopping or dropping it tears both down.
    ///
    /// [`apply_push`]: LocalStreamMerger::apply_push
    ///
    /// # Errors
    /// Returns `FeedError::Store` when the subscription cannot be
    /// established.
    pub async fn spawn_ingest(self: &Arc<Self>) -> Result<StreamHandle, FeedError> {
        let (store_handle, mut rx) = self.store.subscribe_inserts().await?;
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let merger = Arc::clone(self);
        let join = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = &mut stop_rx => break,
                    maybe_row = rx.recv() => {
                        let Some(row) = maybe_row else { break };
                        let _ = merger.apply_push(&row);
                    }
                }
            }
            store_handle.stop().await;
        });
        Ok(StreamHandle::new(join, stop_tx))
    }

    fn normalize_rows(&self, rows: &[StoreRow]) -> Series {
        Series::from_points(rows.iter().filter(|r| (self.filter)(r)).filter_map(|r| {
            match r.normalize() {
                Ok(p) => Some(p),
                Err(_e) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(error = %_e, "dropping malformed store row");
                    None
                }
            }
        }))
    }
}
