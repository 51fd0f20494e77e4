use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pulsefeed_core::{FeedError, LocalStore, StoreRow, StreamHandle};
use tokio::sync::{Mutex, mpsc, oneshot};

/// In-memory local store with a fan-out push subscription.
///
/// Rows are kept in insertion order, which tests keep ascending by
/// `recorded_at`. Reads answer newest first, mirroring the real store.
/// `set_fail_reads` makes every read return a storage error so callers'
/// non-fatal handling can be exercised.
#[derive(Default)]
pub struct MockLocalStore {
    rows: Mutex<Vec<StoreRow>>,
    subscribers: Mutex<Vec<mpsc::Sender<StoreRow>>>,
    fail_reads: AtomicBool,
}

impl MockLocalStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with rows in ascending `recorded_at` order.
    pub async fn with_rows(rows: Vec<StoreRow>) -> Self {
        let store = Self::new();
        *store.rows.lock().await = rows;
        store
    }

    /// Append a row and deliver it to every live subscriber.
    pub async fn push(&self, row: StoreRow) {
        self.rows.lock().await.push(row.clone());
        let mut subscribers = self.subscribers.lock().await;
        let mut live = Vec::with_capacity(subscribers.len());
        for tx in subscribers.drain(..) {
            if tx.send(row.clone()).await.is_ok() {
                live.push(tx);
            }
        }
        *subscribers = live;
    }

    /// Make every subsequent row read fail with a storage error.
    /// Subscriptions are unaffected.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    fn check_readable(&self) -> Result<(), FeedError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(FeedError::store("injected read failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl LocalStore for MockLocalStore {
    async fn snapshot(&self, limit: usize) -> Result<Vec<StoreRow>, FeedError> {
        self.check_readable()?;
        let rows = self.rows.lock().await;
        Ok(rows.iter().rev().take(limit).cloned().collect())
    }

    async fn older_than(
        &self,
        before: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<StoreRow>, FeedError> {
        self.check_readable()?;
        let rows = self.rows.lock().await;
        Ok(rows
            .iter()
            .rev()
            .filter(|row| row.normalize().is_ok_and(|p| p.ts < before))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn subscribe_inserts(
        &self,
    ) -> Result<(StreamHandle, mpsc::Receiver<StoreRow>), FeedError> {
        let (tx, rx) = mpsc::channel::<StoreRow>(1024);
        self.subscribers.lock().await.push(tx);
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        // The subscription has no work of its own; the task just parks until
        // it is stopped, at which point the receiver side goes away and the
        // sender is pruned on the next push.
        let join = tokio::spawn(async move {
            let _ = stop_rx.await;
        });
        Ok((StreamHandle::new(join, stop_tx), rx))
    }
}
