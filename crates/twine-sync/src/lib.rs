//! Polling synchronisation between a [`RemoteSource`](twine_core::RemoteSource)
//! and a [`MessageStore`](twine_core::MessageStore).
//!
//! One [`SyncEngine`] exists per account session. It pulls everything newer
//! than the cache's watermark on a self-rearming timer, persists it, and
//! publishes one [`ThreadEvent`](twine_core::event::ThreadEvent) per thread
//! that gained messages. Provider failures never escape the loop; they only
//! lengthen the wait before the next attempt.

mod config;
mod engine;

pub mod error;

pub use config::SyncConfig;
pub use engine::{SyncEngine, SyncHandle, SyncPhase, SyncStatus, fetch_lower_bound};
pub use error::{Error, Result};
