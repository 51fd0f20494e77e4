//! pulsefeed-core
//!
//! Core types, collaborator traits, and windowing primitives shared across the
//! pulsefeed workspace.
//!
//! - `types`: common data structures (points, series, timeframes, cards).
//! - `connector`: the `MarketService` and `LocalStore` collaborator traits and
//!   the tagged three-way `FetchOutcome`.
//! - `window`: the pure windowing engine (anchor search, window slicing,
//!   percentage change, card building).
//!
//! Async runtime (Tokio)
//! ---------------------
//! This crate assumes the Tokio ecosystem as the async runtime. Public APIs
//! are explicitly coupled to Tokio types:
//!
//! - `stream::StreamHandle` wraps `tokio::task::JoinHandle<()>` and uses
//!   `tokio::sync::oneshot::Sender<()>` for cooperative shutdown.
//! - `connector::LocalStore::subscribe_inserts` returns
//!   `(StreamHandle, tokio::sync::mpsc::Receiver<StoreRow>)`.
//!
//! Code that consumes push subscriptions must run under a Tokio 1.x runtime.
#![warn(missing_docs)]

/// Engine configuration constants supplied by the host process.
pub mod config;
/// Collaborator traits for the Market Service and Local Store boundaries.
pub mod connector;
/// Unified error taxonomy for the pulsefeed workspace.
pub mod error;
/// Handle type for push-subscription tasks.
pub mod stream;
/// Common data structures: points, series, timeframes, cards, raw rows.
pub mod types;
/// Pure windowing engine: anchor search, slicing, and card building.
pub mod window;

pub use config::FeedConfig;
pub use connector::{FetchOutcome, LocalStore, MarketService};
pub use error::FeedError;
pub use stream::StreamHandle;
pub use types::*;
pub use window::{build_cards, first_at_or_after, percent_change, slice_window};
