//! Polling cadence.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timings for the sync loop. Every field is optional in configuration files
/// and falls back to the defaults below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
  /// Wait after a successful pull.
  pub poll_interval_ms:    u64,
  /// Wait after a failed pull.
  pub backoff_interval_ms: u64,
  /// [`SyncHandle::resume`](crate::SyncHandle::resume) only pulls early if the
  /// last success is older than this.
  pub resume_threshold_ms: u64,
  /// Added to the watermark to form the next fetch's lower bound. Absorbs
  /// skew between the provider's created and sent timestamps.
  pub watermark_margin_ms: i64,
}

impl Default for SyncConfig {
  fn default() -> Self {
    Self {
      poll_interval_ms:    8_000,
      backoff_interval_ms: 60_000,
      resume_threshold_ms: 5_000,
      watermark_margin_ms: 2_000,
    }
  }
}

impl SyncConfig {
  pub fn poll_interval(&self) -> Duration { Duration::from_millis(self.poll_interval_ms) }

  pub fn backoff_interval(&self) -> Duration { Duration::from_millis(self.backoff_interval_ms) }

  pub fn resume_threshold(&self) -> Duration { Duration::from_millis(self.resume_threshold_ms) }
}
