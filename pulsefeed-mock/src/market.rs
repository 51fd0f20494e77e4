use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use pulsefeed_core::{FetchOutcome, MarketSnapshot, MarketService, ResolutionClass, Series};

struct Scripted<T> {
    outcome: FetchOutcome<T>,
    delay: Option<Duration>,
}

/// Market service that replays scripted outcomes, then per-asset defaults.
///
/// Each call pops the oldest scripted entry for its operation. With no script
/// queued the configured default answers, and with no default the call is
/// [`FetchOutcome::Unavailable`]. Call counters let tests assert how many
/// times the network was actually touched.
#[derive(Default)]
pub struct MockMarketService {
    snapshot_script: Mutex<VecDeque<Scripted<MarketSnapshot>>>,
    chart_script: Mutex<VecDeque<Scripted<Series>>>,
    default_snapshot: Mutex<Option<MarketSnapshot>>,
    default_charts: Mutex<HashMap<ResolutionClass, Series>>,
    snapshot_calls: AtomicUsize,
    chart_calls: AtomicUsize,
}

impl MockMarketService {
    /// Create a service with no scripts and no defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the next snapshot outcome.
    ///
    /// # Panics
    /// Panics if the internal mutex is poisoned.
    pub fn script_snapshot(&self, outcome: FetchOutcome<MarketSnapshot>) {
        let mut script = self.snapshot_script.lock().expect("mutex poisoned");
        script.push_back(Scripted {
            outcome,
            delay: None,
        });
    }

    /// Queue the next snapshot outcome, delivered after `delay`.
    ///
    /// # Panics
    /// Panics if the internal mutex is poisoned.
    pub fn script_snapshot_after(&self, delay: Duration, outcome: FetchOutcome<MarketSnapshot>) {
        let mut script = self.snapshot_script.lock().expect("mutex poisoned");
        script.push_back(Scripted {
            outcome,
            delay: Some(delay),
        });
    }

    /// Queue the next chart outcome.
    ///
    /// # Panics
    /// Panics if the internal mutex is poisoned.
    pub fn script_chart(&self, outcome: FetchOutcome<Series>) {
        let mut script = self.chart_script.lock().expect("mutex poisoned");
        script.push_back(Scripted {
            outcome,
            delay: None,
        });
    }

    /// Queue the next chart outcome, delivered after `delay`.
    ///
    /// # Panics
    /// Panics if the internal mutex is poisoned.
    pub fn script_chart_after(&self, delay: Duration, outcome: FetchOutcome<Series>) {
        let mut script = self.chart_script.lock().expect("mutex poisoned");
        script.push_back(Scripted {
            outcome,
            delay: Some(delay),
        });
    }

    /// Set the snapshot returned once the script queue is empty.
    ///
    /// # Panics
    /// Panics if the internal mutex is poisoned.
    pub fn set_default_snapshot(&self, snapshot: MarketSnapshot) {
        *self.default_snapshot.lock().expect("mutex poisoned") = Some(snapshot);
    }

    /// Set the chart returned for `resolution` once the script queue is empty.
    ///
    /// # Panics
    /// Panics if the internal mutex is poisoned.
    pub fn set_default_chart(&self, resolution: ResolutionClass, series: Series) {
        let mut defaults = self.default_charts.lock().expect("mutex poisoned");
        defaults.insert(resolution, series);
    }

    /// Number of snapshot calls made so far.
    pub fn snapshot_calls(&self) -> usize {
        self.snapshot_calls.load(Ordering::SeqCst)
    }

    /// Number of chart calls made so far.
    pub fn chart_calls(&self) -> usize {
        self.chart_calls.load(Ordering::SeqCst)
    }

    /// Total calls across both operations.
    pub fn total_calls(&self) -> usize {
        self.snapshot_calls() + self.chart_calls()
    }
}

#[async_trait]
impl MarketService for MockMarketService {
    async fn snapshot(&self, _asset: &str) -> FetchOutcome<MarketSnapshot> {
        self.snapshot_calls.fetch_add(1, Ordering::SeqCst);
        // Pop before any await so the lock is not held across it.
        let scripted = self
            .snapshot_script
            .lock()
            .expect("mutex poisoned")
            .pop_front();
        if let Some(s) = scripted {
            if let Some(delay) = s.delay {
                tokio::time::sleep(delay).await;
            }
            return s.outcome;
        }
        let default = self.default_snapshot.lock().expect("mutex poisoned").clone();
        match default {
            Some(snapshot) => FetchOutcome::Ok(snapshot),
            None => FetchOutcome::Unavailable,
        }
    }

    async fn chart(&self, _asset: &str, resolution: ResolutionClass) -> FetchOutcome<Series> {
        self.chart_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self
            .chart_script
            .lock()
            .expect("mutex poisoned")
            .pop_front();
        if let Some(s) = scripted {
            if let Some(delay) = s.delay {
                tokio::time::sleep(delay).await;
            }
            return s.outcome;
        }
        let default = self
            .default_charts
            .lock()
            .expect("mutex poisoned")
            .get(&resolution)
            .cloned();
        match default {
            Some(series) => FetchOutcome::Ok(series),
            None => FetchOutcome::Unavailable,
        }
    }
}
