//! Caching and backoff layers that sit between the hydrator and the remote
//! market service.
//!
//! Nothing here performs I/O. The hydrator composes these pieces in a fixed
//! order in front of every remote call: backoff gate first, then the TTL
//! cache, then the fetch itself.

#![warn(missing_docs)]

mod backoff;
mod cache;
mod services;

pub use crate::backoff::BackoffTracker;
pub use crate::cache::TtlCache;
pub use crate::services::FeedServices;
