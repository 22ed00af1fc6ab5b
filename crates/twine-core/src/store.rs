//! The `MessageStore` trait, the local cache of the provider log.
//!
//! Implemented by storage backends (e.g. `twine-store-sqlite`). The sync
//! engine and the query facade depend on this abstraction, not on a concrete
//! backend.

use std::future::Future;

use crate::{
  message::{Message, MessageRecord},
  page::Cursor,
  thread::{Thread, User},
};

/// Abstraction over the local message cache.
///
/// Records are keyed by their provider id. Apart from the read flag they are
/// never modified once written, and they are never deleted.
///
/// All methods return `Send` futures so the trait can be driven from spawned
/// tasks on a multi-threaded runtime.
pub trait MessageStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Insert or replace `records` in a single atomic batch.
  ///
  /// Re-inserting a known id overwrites its content but never clears a read
  /// flag. Returns the records whose ids were not previously stored, in
  /// input order.
  fn upsert_messages(
    &self,
    records: Vec<MessageRecord>,
  ) -> impl Future<Output = Result<Vec<MessageRecord>, Self::Error>> + Send + '_;

  /// Mark every message in `thread_id` with `timestamp <= upto` as read.
  /// Returns how many messages changed state.
  fn mark_read<'a>(
    &'a self,
    thread_id: &'a str,
    upto: i64,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + 'a;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// The newest stored timestamp, or `None` when the cache is empty.
  fn watermark(&self) -> impl Future<Output = Result<Option<i64>, Self::Error>> + Send + '_;

  /// Every thread in the cache, most recently active first.
  fn list_threads<'a>(
    &'a self,
    current_user: &'a User,
  ) -> impl Future<Output = Result<Vec<Thread>, Self::Error>> + Send + 'a;

  /// The newest `limit` messages of `thread_id` strictly before the cursor
  /// position (when given) in `(timestamp, id)` order, returned oldest first.
  fn list_messages<'a>(
    &'a self,
    current_user: &'a User,
    thread_id: &'a str,
    limit: usize,
    before: Option<&'a Cursor>,
  ) -> impl Future<Output = Result<Vec<Message>, Self::Error>> + Send + 'a;

  /// Look up a single record. Returns `None` if not found.
  fn get_message<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<Option<MessageRecord>, Self::Error>> + Send + 'a;
}
