//! Message types: the raw provider record, the persisted record, and the
//! view handed to the host.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─── Provider record ─────────────────────────────────────────────────────────

/// A message as the remote provider reports it: a directed edge between two
/// phone numbers with no notion of conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
  /// Provider-assigned identifier; globally unique.
  pub sid:          String,
  pub body:         String,
  pub from:         String,
  pub to:           String,
  /// When the provider created the message. Always present, unlike the
  /// delivery time.
  pub date_created: DateTime<Utc>,
  pub date_sent:    Option<DateTime<Utc>>,
  /// Provider delivery status (`queued`, `sent`, `delivered`, ...), if known.
  pub status:       Option<String>,
}

// ─── Persisted record ────────────────────────────────────────────────────────

/// The only persisted entity. One row per provider message.
///
/// Every field except `is_read` is fixed once stored; `is_read` only ever
/// flips from `false` to `true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
  pub id:                String,
  pub body:              String,
  /// The counterpart's phone number. Doubles as the thread key.
  pub other_participant: String,
  /// `true` if the local account originated the message.
  pub is_sender:         bool,
  pub is_read:           bool,
  /// Provider creation time in epoch milliseconds.
  pub timestamp:         i64,
}

impl MessageRecord {
  /// The thread this record belongs to.
  pub fn thread_key(&self) -> &str { &self.other_participant }
}

// ─── View ────────────────────────────────────────────────────────────────────

/// A message as presented to the host, positioned within its thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
  pub id:        String,
  pub thread_id: String,
  /// Participant identifier of the author (see [`crate::identity`]).
  pub sender_id: String,
  pub text:      String,
  pub timestamp: DateTime<Utc>,
  pub is_sender: bool,
  pub is_read:   bool,
}

/// Convert epoch milliseconds into a UTC instant, clamping values chrono
/// cannot represent to the epoch.
pub fn millis_to_datetime(millis: i64) -> DateTime<Utc> {
  DateTime::from_timestamp_millis(millis).unwrap_or_default()
}
