//! Projection: pure mapping between provider records, persisted records and
//! host-facing views.
//!
//! The provider log has no conversation entity. Threads are inferred here by
//! grouping records on their counterpart number and are recomputed on every
//! read; nothing in this module touches storage.

use std::collections::BTreeMap;

use crate::{
  event::ThreadEvent,
  identity::participant_id,
  message::{Message, MessageRecord, RawMessage, millis_to_datetime},
  thread::{Thread, User},
};

// ─── Provider → record ───────────────────────────────────────────────────────

/// Normalise a provider message from the point of view of `self_number`.
///
/// A message whose sender is `self_number` is outbound and is stored as
/// already read; anything else is inbound from its sender.
pub fn to_message_record(raw: &RawMessage, self_number: &str) -> MessageRecord {
  let is_sender = raw.from == self_number;
  let other_participant = if is_sender { &raw.to } else { &raw.from };
  MessageRecord {
    id:                raw.sid.clone(),
    body:              raw.body.clone(),
    other_participant: other_participant.clone(),
    is_sender,
    is_read:           is_sender,
    timestamp:         raw.date_created.timestamp_millis(),
  }
}

pub fn to_message_records(raws: &[RawMessage], self_number: &str) -> Vec<MessageRecord> {
  raws.iter().map(|raw| to_message_record(raw, self_number)).collect()
}

// ─── Record → view ───────────────────────────────────────────────────────────

/// Present a stored record to the host. A lookup miss maps to `None`.
pub fn to_message_view(record: Option<&MessageRecord>, current_user: &User) -> Option<Message> {
  record.map(|r| message_view(r, current_user))
}

/// Present a batch of stored records, preserving their order.
pub fn to_message_views(records: &[MessageRecord], current_user: &User) -> Vec<Message> {
  records.iter().map(|r| message_view(r, current_user)).collect()
}

/// Present one stored record.
pub fn message_view(record: &MessageRecord, current_user: &User) -> Message {
  let sender_id = if record.is_sender {
    current_user.id.clone()
  } else {
    participant_id(&record.other_participant)
  };
  Message {
    id: record.id.clone(),
    thread_id: record.other_participant.clone(),
    sender_id,
    text: record.body.clone(),
    timestamp: millis_to_datetime(record.timestamp),
    is_sender: record.is_sender,
    is_read: record.is_read,
  }
}

// ─── Thread inference ────────────────────────────────────────────────────────

fn chronological(a: &MessageRecord, b: &MessageRecord) -> std::cmp::Ordering {
  a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id))
}

/// Group records by thread key, each group ordered oldest first. Ties on
/// timestamp are broken by id so the order is total.
pub fn group_by_thread(
  records: impl IntoIterator<Item = MessageRecord>,
) -> BTreeMap<String, Vec<MessageRecord>> {
  let mut threads: BTreeMap<String, Vec<MessageRecord>> = BTreeMap::new();
  for record in records {
    threads
      .entry(record.other_participant.clone())
      .or_default()
      .push(record);
  }
  for messages in threads.values_mut() {
    messages.sort_by(chronological);
  }
  threads
}

/// Build the view of one thread from its records.
///
/// The thread is unread unless its newest message is also its newest read
/// message.
pub fn to_thread_view(
  thread_key: &str,
  mut records: Vec<MessageRecord>,
  current_user: &User,
) -> Thread {
  records.sort_by(chronological);

  let latest_id = records.last().map(|r| r.id.clone());
  let last_read_message_id = records
    .iter()
    .rev()
    .find(|r| r.is_read)
    .map(|r| r.id.clone());
  let is_unread = latest_id != last_read_message_id;
  let last_activity = millis_to_datetime(records.last().map_or(0, |r| r.timestamp));

  Thread {
    id: thread_key.to_owned(),
    title: thread_key.to_owned(),
    is_unread,
    last_read_message_id,
    participants: vec![current_user.clone(), User::counterpart(thread_key)],
    messages: to_message_views(&records, current_user),
    last_activity,
  }
}

/// Reduce a flat set of records into thread views, most recently active
/// first.
pub fn to_thread_views(
  records: impl IntoIterator<Item = MessageRecord>,
  current_user: &User,
) -> Vec<Thread> {
  let mut threads: Vec<Thread> = group_by_thread(records)
    .into_iter()
    .map(|(key, records)| to_thread_view(&key, records, current_user))
    .collect();
  threads.sort_by(|a, b| b.last_activity.cmp(&a.last_activity).then_with(|| a.id.cmp(&b.id)));
  threads
}

/// One change event per thread touched by `records`.
pub fn thread_events(
  records: impl IntoIterator<Item = MessageRecord>,
  current_user: &User,
) -> Vec<ThreadEvent> {
  group_by_thread(records)
    .into_iter()
    .map(|(thread_id, records)| ThreadEvent {
      thread_id,
      messages: to_message_views(&records, current_user),
    })
    .collect()
}
