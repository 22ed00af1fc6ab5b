//! [`Facade`], the query surface over the local cache.
//!
//! Reads never reach the provider; only [`Facade::send_message`] does. All
//! answers are computed from the cache as it stands, so they may trail the
//! provider by up to one poll interval.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};
use twine_core::{
  message::Message,
  page::{PageRequest, Paginated},
  projection::{message_view, thread_events, to_message_record, to_message_view},
  source::RemoteSource,
  store::MessageStore,
  thread::{Thread, User},
};
use twine_sync::{SyncHandle, SyncStatus};

use crate::error::ApiError;

/// Outcome of a mark-as-read request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReadReceipt {
  /// Messages that flipped from unread to read.
  pub updated:  usize,
  /// Whether the message id resolved to a message of the thread.
  pub resolved: bool,
}

impl ReadReceipt {
  const UNRESOLVED: Self = Self { updated: 0, resolved: false };
}

/// Host-facing operations for one account session.
pub struct Facade<S, R> {
  store:        Arc<S>,
  source:       Arc<R>,
  current_user: User,
  sync:         Option<SyncHandle>,
}

impl<S, R> Facade<S, R>
where
  S: MessageStore,
  R: RemoteSource,
{
  pub fn new(store: Arc<S>, source: Arc<R>) -> Self {
    let current_user = source.current_user();
    Self { store, source, current_user, sync: None }
  }

  /// Attach the session's sync engine: exposes its status and resume
  /// control, and routes local sends through its event channel.
  pub fn with_sync(mut self, sync: SyncHandle) -> Self {
    self.sync = Some(sync);
    self
  }

  pub fn current_user(&self) -> &User { &self.current_user }

  // ── Threads ───────────────────────────────────────────────────────────────

  /// Every thread, in a single page.
  pub async fn list_threads(&self) -> Result<Paginated<Thread>, ApiError> {
    let threads = self
      .store
      .list_threads(&self.current_user)
      .await
      .map_err(|e| ApiError::Store(Box::new(e)))?;
    Ok(Paginated::complete(threads))
  }

  // ── Messages ──────────────────────────────────────────────────────────────

  /// One page of a thread, oldest first, ending just before the cursor.
  pub async fn list_messages(
    &self,
    thread_id: &str,
    request:   PageRequest,
  ) -> Result<Paginated<Message>, ApiError> {
    let items = self
      .store
      .list_messages(&self.current_user, thread_id, request.limit, request.before())
      .await
      .map_err(|e| ApiError::Store(Box::new(e)))?;
    Ok(Paginated::of_messages(items, &request))
  }

  pub async fn get_message(&self, id: &str) -> Result<Option<Message>, ApiError> {
    let record = self
      .store
      .get_message(id)
      .await
      .map_err(|e| ApiError::Store(Box::new(e)))?;
    Ok(to_message_view(record.as_ref(), &self.current_user))
  }

  /// Mark `message_id` and everything before it in `thread_id` as read.
  ///
  /// An id that is unknown, or that belongs to another thread, resolves to
  /// nothing and changes nothing.
  pub async fn mark_read(&self, thread_id: &str, message_id: &str) -> Result<ReadReceipt, ApiError> {
    let record = self
      .store
      .get_message(message_id)
      .await
      .map_err(|e| ApiError::Store(Box::new(e)))?;

    let Some(record) = record.filter(|r| r.thread_key() == thread_id) else {
      debug!(thread_id, message_id, "read marker did not resolve");
      return Ok(ReadReceipt::UNRESOLVED);
    };

    let updated = self
      .store
      .mark_read(thread_id, record.timestamp)
      .await
      .map_err(|e| ApiError::Store(Box::new(e)))?;
    Ok(ReadReceipt { updated, resolved: true })
  }

  /// Send `text` to the counterpart of `thread_id`, then cache the provider's
  /// record of it.
  pub async fn send_message(&self, thread_id: &str, text: &str) -> Result<Message, ApiError> {
    if text.trim().is_empty() {
      return Err(ApiError::BadRequest("message text is empty".to_owned()));
    }

    let raw = self
      .source
      .send_message(thread_id, text)
      .await
      .map_err(|e| ApiError::Send(Box::new(e)))?;

    let record = to_message_record(&raw, &self.current_user.phone_number);
    let view = message_view(&record, &self.current_user);
    let inserted = self
      .store
      .upsert_messages(vec![record])
      .await
      .map_err(|e| ApiError::Store(Box::new(e)))?;

    info!(thread_id, id = %view.id, "sent message");
    if let Some(sync) = &self.sync {
      sync.publish(thread_events(inserted, &self.current_user));
    }
    Ok(view)
  }

  // ── Sync control ──────────────────────────────────────────────────────────

  pub fn sync_status(&self) -> Option<SyncStatus> { self.sync.as_ref().map(SyncHandle::status) }

  /// Ask the engine for an immediate pull. `false` when nothing was
  /// triggered, including when no engine is attached.
  pub fn resume(&self) -> bool { self.sync.as_ref().is_some_and(SyncHandle::resume) }
}
