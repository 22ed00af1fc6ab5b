//! [`SyncEngine`], the polling loop, and [`SyncHandle`], its control
//! surface.
//!
//! The loop is a single spawned task that sleeps, pulls, and re-arms its own
//! timer. Because the next sleep only starts once a pull has finished, a slow
//! provider delays the following cycle instead of overlapping it. Disposal is
//! a terminal flag checked every time the task wakes.

use std::{
  sync::{
    Arc, Mutex, MutexGuard, PoisonError,
    atomic::{AtomicBool, Ordering},
  },
  time::{Duration, Instant},
};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::{
  sync::{Notify, broadcast},
  task::JoinHandle,
};
use tracing::{debug, error, info, warn};
use twine_core::{
  event::ThreadEvent,
  message::millis_to_datetime,
  projection::{thread_events, to_message_records},
  source::RemoteSource,
  store::MessageStore,
  thread::User,
};

use crate::{Error, Result, SyncConfig};

/// Buffered events per subscriber before the slowest one starts lagging.
const EVENT_CAPACITY: usize = 256;

// ─── Status ──────────────────────────────────────────────────────────────────

/// Where the loop currently is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPhase {
  /// Not started, or between a finished pull and the next scheduled tick.
  #[default]
  Idle,
  /// Waiting for the next tick.
  Scheduled,
  /// A pull is in flight.
  Running,
  /// Terminal.
  Disposed,
}

/// A snapshot for the host.
#[derive(Debug, Clone, Serialize)]
pub struct SyncStatus {
  pub phase:        SyncPhase,
  pub last_success: Option<DateTime<Utc>>,
}

/// The lower bound for the next fetch: the watermark pushed forward by
/// `margin_ms`. An empty cache has no bound, so the whole history is fetched.
pub fn fetch_lower_bound(watermark: Option<i64>, margin_ms: i64) -> Option<DateTime<Utc>> {
  watermark.map(|w| millis_to_datetime(w.saturating_add(margin_ms)))
}

// ─── Shared state ────────────────────────────────────────────────────────────

#[derive(Default)]
struct State {
  phase:           SyncPhase,
  last_success:    Option<Instant>,
  last_success_at: Option<DateTime<Utc>>,
}

/// Polling state for one account session, shared between the loop task and
/// every handle.
#[derive(Default)]
struct Shared {
  disposed: AtomicBool,
  wake:     Notify,
  state:    Mutex<State>,
}

impl Shared {
  fn is_disposed(&self) -> bool { self.disposed.load(Ordering::Acquire) }

  fn state(&self) -> MutexGuard<'_, State> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn set_phase(&self, phase: SyncPhase) {
    let mut state = self.state();
    if state.phase != SyncPhase::Disposed {
      state.phase = phase;
    }
  }

  fn record_success(&self) {
    let mut state = self.state();
    state.last_success = Some(Instant::now());
    state.last_success_at = Some(Utc::now());
  }
}

// ─── Engine ──────────────────────────────────────────────────────────────────

/// Keeps a [`MessageStore`] in step with a [`RemoteSource`].
///
/// Build with [`SyncEngine::new`], take any event subscriptions needed for
/// the initial pull, then [`start`](SyncEngine::start) it.
pub struct SyncEngine<S, R> {
  store:        Arc<S>,
  source:       Arc<R>,
  config:       SyncConfig,
  current_user: User,
  events:       broadcast::Sender<ThreadEvent>,
  shared:       Arc<Shared>,
}

impl<S, R> SyncEngine<S, R>
where
  S: MessageStore + 'static,
  R: RemoteSource + 'static,
{
  pub fn new(store: Arc<S>, source: Arc<R>, config: SyncConfig) -> Self {
    let current_user = source.current_user();
    let (events, _) = broadcast::channel(EVENT_CAPACITY);
    Self {
      store,
      source,
      config,
      current_user,
      events,
      shared: Arc::new(Shared::default()),
    }
  }

  /// Receive thread events, including those produced by the initial pull.
  pub fn subscribe(&self) -> broadcast::Receiver<ThreadEvent> { self.events.subscribe() }

  /// Run the initial pull, then hand the loop to a background task.
  ///
  /// A provider failure during the initial pull is not fatal: the loop starts
  /// in backoff. A cache failure is returned and nothing is spawned.
  pub async fn start(self) -> Result<SyncHandle> {
    info!(number = %self.current_user.phone_number, "starting sync");

    let first_delay = match self.cycle().await {
      Ok(_) => self.config.poll_interval(),
      Err(Error::Source(e)) => {
        warn!(error = %e, "initial pull failed; backing off");
        self.config.backoff_interval()
      }
      Err(e) => return Err(e),
    };

    let shared = self.shared.clone();
    let events = self.events.clone();
    let resume_threshold = self.config.resume_threshold();
    let task = tokio::spawn(self.run(first_delay));

    Ok(SyncHandle {
      shared,
      events,
      resume_threshold,
      task: Arc::new(tokio::sync::Mutex::new(Some(task))),
    })
  }

  async fn run(self, mut delay: Duration) {
    loop {
      if self.shared.is_disposed() {
        break;
      }

      // Registered before the phase flips so a resume that sees `Scheduled`
      // always reaches this wait.
      let wake = self.shared.wake.notified();
      tokio::pin!(wake);
      wake.as_mut().enable();
      self.shared.set_phase(SyncPhase::Scheduled);

      tokio::select! {
        () = tokio::time::sleep(delay) => {}
        () = &mut wake => {
          debug!("pending tick cancelled; pulling now");
        }
      }

      if self.shared.is_disposed() {
        break;
      }

      delay = match self.cycle().await {
        Ok(_) => self.config.poll_interval(),
        Err(Error::Source(e)) => {
          warn!(error = %e, retry_in = ?self.config.backoff_interval(), "pull failed; backing off");
          self.config.backoff_interval()
        }
        Err(e) => {
          error!(error = %e, "sync cycle failed");
          self.config.backoff_interval()
        }
      };
    }

    self.shared.set_phase(SyncPhase::Disposed);
    debug!("sync loop stopped");
  }

  async fn cycle(&self) -> Result<usize> {
    self.shared.set_phase(SyncPhase::Running);
    let result = self.pull().await;
    self.shared.set_phase(SyncPhase::Idle);
    result
  }

  /// One pull: fetch past the watermark, persist, then notify per thread.
  async fn pull(&self) -> Result<usize> {
    let watermark = self.store.watermark().await.map_err(Error::cache)?;
    let since = fetch_lower_bound(watermark, self.config.watermark_margin_ms);

    let raws = self
      .source
      .messages_of_number(since)
      .await
      .map_err(Error::remote)?;

    if self.shared.is_disposed() {
      debug!(fetched = raws.len(), "disposed during pull; discarding");
      return Ok(0);
    }

    let records = to_message_records(&raws, &self.current_user.phone_number);
    let inserted = self
      .store
      .upsert_messages(records)
      .await
      .map_err(Error::cache)?;
    self.shared.record_success();

    let count = inserted.len();
    if count == 0 {
      debug!(fetched = raws.len(), "no new messages");
      return Ok(0);
    }

    for event in thread_events(inserted, &self.current_user) {
      // No subscribers is fine.
      let _ = self.events.send(event);
    }
    info!(new = count, fetched = raws.len(), "synced messages");
    Ok(count)
  }
}

// ─── Handle ──────────────────────────────────────────────────────────────────

/// Control surface for a running engine.
///
/// Cheap to clone; every clone controls the same loop.
#[derive(Clone)]
pub struct SyncHandle {
  shared:           Arc<Shared>,
  events:           broadcast::Sender<ThreadEvent>,
  resume_threshold: Duration,
  task:             Arc<tokio::sync::Mutex<Option<JoinHandle<()>>>>,
}

impl SyncHandle {
  pub fn subscribe(&self) -> broadcast::Receiver<ThreadEvent> { self.events.subscribe() }

  /// Publish events for messages persisted outside the loop (a local send).
  pub fn publish(&self, events: impl IntoIterator<Item = ThreadEvent>) {
    for event in events {
      let _ = self.events.send(event);
    }
  }

  pub fn status(&self) -> SyncStatus {
    let state = self.shared.state();
    SyncStatus { phase: state.phase, last_success: state.last_success_at }
  }

  pub fn is_disposed(&self) -> bool { self.shared.is_disposed() }

  /// Pull now instead of waiting out the pending tick, if the last successful
  /// pull is older than the resume threshold (or there has been none).
  ///
  /// Returns whether a pull was triggered. Does nothing unless the loop is
  /// waiting for its next tick, so it never queues a pull behind one that is
  /// already running.
  pub fn resume(&self) -> bool {
    if self.shared.is_disposed() {
      return false;
    }

    // Held across the notify so the phase cannot move underneath it.
    let state = self.shared.state();
    if state.phase != SyncPhase::Scheduled {
      return false;
    }
    let stale = state
      .last_success
      .is_none_or(|at| at.elapsed() > self.resume_threshold);

    if stale {
      info!("resuming; pulling now");
      self.shared.wake.notify_waiters();
    }
    stale
  }

  /// Stop polling for good.
  ///
  /// Cancels the pending tick and waits for the loop task to exit. A pull
  /// already in flight is allowed to finish, but its results are discarded.
  pub async fn dispose(&self) {
    if !self.shared.disposed.swap(true, Ordering::AcqRel) {
      info!("disposing sync");
    }
    self.shared.wake.notify_one();

    let task = self.task.lock().await.take();
    if let Some(task) = task
      && let Err(e) = task.await
    {
      warn!(error = %e, "sync task ended abnormally");
    }
    self.shared.set_phase(SyncPhase::Disposed);
  }
}
