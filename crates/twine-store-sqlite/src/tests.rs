//! Integration tests for `SqliteStore` against an in-memory database.

use twine_core::{
  message::MessageRecord,
  page::{Cursor, PageRequest, Paginated},
  store::MessageStore,
  thread::User,
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn me() -> User { User::current("+1", None) }

fn inbound(id: &str, other: &str, ts: i64) -> MessageRecord {
  MessageRecord {
    id:                id.into(),
    body:              format!("hello from {other} ({id})"),
    other_participant: other.into(),
    is_sender:         false,
    is_read:           false,
    timestamp:         ts,
  }
}

fn outbound(id: &str, other: &str, ts: i64) -> MessageRecord {
  MessageRecord { is_sender: true, is_read: true, ..inbound(id, other, ts) }
}

// ─── Upsert ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn upsert_returns_only_new_records() {
  let s = store().await;

  let first = s
    .upsert_messages(vec![inbound("a", "+2", 100), inbound("b", "+2", 200)])
    .await
    .unwrap();
  assert_eq!(first.len(), 2);

  let second = s
    .upsert_messages(vec![inbound("b", "+2", 200), inbound("c", "+3", 300)])
    .await
    .unwrap();
  let ids: Vec<_> = second.iter().map(|r| r.id.as_str()).collect();
  assert_eq!(ids, ["c"]);
}

#[tokio::test]
async fn upsert_is_idempotent() {
  let s = store().await;
  let batch = vec![inbound("a", "+2", 100), outbound("b", "+2", 200)];

  s.upsert_messages(batch.clone()).await.unwrap();
  let threads_once = s.list_threads(&me()).await.unwrap();
  let watermark_once = s.watermark().await.unwrap();

  let again = s.upsert_messages(batch).await.unwrap();
  assert!(again.is_empty());

  let threads_twice = s.list_threads(&me()).await.unwrap();
  assert_eq!(s.message_count().await.unwrap(), 2);
  assert_eq!(s.watermark().await.unwrap(), watermark_once);
  assert_eq!(threads_once.len(), threads_twice.len());
  assert_eq!(threads_once[0].messages, threads_twice[0].messages);
}

#[tokio::test]
async fn duplicate_ids_within_one_batch_count_once() {
  let s = store().await;
  let inserted = s
    .upsert_messages(vec![inbound("a", "+2", 100), inbound("a", "+2", 100)])
    .await
    .unwrap();
  assert_eq!(inserted.len(), 1);
  assert_eq!(s.message_count().await.unwrap(), 1);
}

#[tokio::test]
async fn upsert_overwrites_content_for_same_id() {
  let s = store().await;
  s.upsert_messages(vec![inbound("a", "+2", 100)]).await.unwrap();

  let mut newer = inbound("a", "+2", 100);
  newer.body = "edited by provider".into();
  s.upsert_messages(vec![newer]).await.unwrap();

  let stored = s.get_message("a").await.unwrap().unwrap();
  assert_eq!(stored.body, "edited by provider");
}

#[tokio::test]
async fn upsert_never_clears_read_flag() {
  let s = store().await;
  s.upsert_messages(vec![inbound("a", "+2", 100)]).await.unwrap();
  s.mark_read("+2", 100).await.unwrap();

  // The next poll window overlaps and re-delivers the same message unread.
  s.upsert_messages(vec![inbound("a", "+2", 100)]).await.unwrap();

  assert!(s.get_message("a").await.unwrap().unwrap().is_read);
}

#[tokio::test]
async fn failed_batch_writes_nothing() {
  let s = store().await;
  s.conn
    .call(|conn| {
      conn.execute_batch(
        r#"CREATE TRIGGER reject_bad BEFORE INSERT ON messages
           WHEN NEW."id" = 'bad'
           BEGIN SELECT RAISE(ABORT, 'rejected'); END;"#,
      )?;
      Ok(())
    })
    .await
    .unwrap();

  let result = s
    .upsert_messages(vec![inbound("good", "+2", 100), inbound("bad", "+2", 200)])
    .await;

  assert!(matches!(result, Err(Error::Database(_))));
  assert_eq!(s.message_count().await.unwrap(), 0);
  assert_eq!(s.watermark().await.unwrap(), None);
}

#[tokio::test]
async fn empty_batch_is_a_no_op() {
  let s = store().await;
  assert!(s.upsert_messages(Vec::new()).await.unwrap().is_empty());
  assert_eq!(s.message_count().await.unwrap(), 0);
}

// ─── Watermark ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn watermark_is_none_when_empty() {
  let s = store().await;
  assert_eq!(s.watermark().await.unwrap(), None);
}

#[tokio::test]
async fn watermark_is_max_timestamp() {
  let s = store().await;
  s.upsert_messages(vec![
    inbound("a", "+2", 300),
    inbound("b", "+3", 100),
    inbound("c", "+2", 200),
  ])
  .await
  .unwrap();
  assert_eq!(s.watermark().await.unwrap(), Some(300));
}

// ─── Threads ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn provider_scenario_yields_one_ordered_thread() {
  use chrono::{TimeZone, Utc};
  use twine_core::{message::RawMessage, projection::to_message_records};

  let raw = |sid: &str, from: &str, to: &str, ts: i64| RawMessage {
    sid:          sid.into(),
    body:         sid.into(),
    from:         from.into(),
    to:           to.into(),
    date_created: Utc.timestamp_millis_opt(ts).unwrap(),
    date_sent:    None,
    status:       None,
  };

  let s = store().await;
  let records = to_message_records(&[raw("a", "+1", "+2", 100), raw("b", "+2", "+1", 200)], "+1");
  s.upsert_messages(records).await.unwrap();

  let threads = s.list_threads(&me()).await.unwrap();
  assert_eq!(threads.len(), 1);
  assert_eq!(threads[0].id, "+2");
  let messages = &threads[0].messages;
  assert_eq!(messages.len(), 2);
  assert_eq!((messages[0].id.as_str(), messages[0].is_sender), ("a", true));
  assert_eq!((messages[1].id.as_str(), messages[1].is_sender), ("b", false));
}

#[tokio::test]
async fn one_thread_per_counterpart() {
  let s = store().await;
  s.upsert_messages(vec![
    inbound("a", "+2", 1),
    outbound("b", "+3", 2),
    inbound("c", "+2", 3),
    inbound("d", "+4", 4),
    outbound("e", "+3", 5),
  ])
  .await
  .unwrap();

  let threads = s.list_threads(&me()).await.unwrap();
  let mut ids: Vec<_> = threads.iter().map(|t| t.id.clone()).collect();
  ids.sort();
  assert_eq!(ids, ["+2", "+3", "+4"]);
}

#[tokio::test]
async fn thread_unread_tracks_latest_read_message() {
  let s = store().await;
  s.upsert_messages(vec![inbound("a", "+2", 100), inbound("b", "+2", 200)])
    .await
    .unwrap();

  let t = &s.list_threads(&me()).await.unwrap()[0];
  assert!(t.is_unread);
  assert_eq!(t.last_read_message_id, None);

  s.mark_read("+2", 100).await.unwrap();
  let t = &s.list_threads(&me()).await.unwrap()[0];
  assert!(t.is_unread);
  assert_eq!(t.last_read_message_id.as_deref(), Some("a"));

  s.mark_read("+2", 200).await.unwrap();
  let t = &s.list_threads(&me()).await.unwrap()[0];
  assert!(!t.is_unread);
  assert_eq!(t.last_read_message_id.as_deref(), Some("b"));
}

#[tokio::test]
async fn own_reply_reads_as_not_unread() {
  let s = store().await;
  s.upsert_messages(vec![inbound("a", "+2", 100), outbound("b", "+2", 200)])
    .await
    .unwrap();

  let t = &s.list_threads(&me()).await.unwrap()[0];
  assert!(!t.is_unread);
}

// ─── Read state ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn mark_read_is_bounded_by_thread_and_timestamp() {
  let s = store().await;
  s.upsert_messages(vec![
    inbound("a", "+2", 100),
    inbound("b", "+2", 200),
    inbound("c", "+2", 300),
    inbound("x", "+3", 150),
  ])
  .await
  .unwrap();

  let changed = s.mark_read("+2", 200).await.unwrap();
  assert_eq!(changed, 2);

  assert!(s.get_message("a").await.unwrap().unwrap().is_read);
  assert!(s.get_message("b").await.unwrap().unwrap().is_read);
  assert!(!s.get_message("c").await.unwrap().unwrap().is_read);
  assert!(!s.get_message("x").await.unwrap().unwrap().is_read);
}

#[tokio::test]
async fn mark_read_never_unmarks() {
  let s = store().await;
  s.upsert_messages(vec![inbound("a", "+2", 100), inbound("b", "+2", 200)])
    .await
    .unwrap();

  s.mark_read("+2", 200).await.unwrap();
  // An older threshold must not undo the newer one.
  let changed = s.mark_read("+2", 50).await.unwrap();
  assert_eq!(changed, 0);

  assert!(s.get_message("a").await.unwrap().unwrap().is_read);
  assert!(s.get_message("b").await.unwrap().unwrap().is_read);
}

// ─── Lookup ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn get_message_missing_returns_none() {
  let s = store().await;
  assert!(s.get_message("nope").await.unwrap().is_none());
}

// ─── Pagination ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn pages_through_thread_without_gaps_or_repeats() {
  let s = store().await;
  s.upsert_messages(
    (1..=5)
      .map(|i| inbound(&format!("m{i}"), "+2", i * 100))
      .collect(),
  )
  .await
  .unwrap();
  // Noise in another thread.
  s.upsert_messages(vec![inbound("other", "+3", 250)]).await.unwrap();

  let mut cursor: Option<Cursor> = None;
  let mut sizes = Vec::new();
  let mut seen = Vec::new();
  loop {
    let req = PageRequest::new(cursor, Some(2)).unwrap();
    let items = s
      .list_messages(&me(), "+2", req.limit, req.before())
      .await
      .unwrap();
    let page = Paginated::of_messages(items, &req);
    if page.items.is_empty() {
      break;
    }
    sizes.push(page.items.len());
    // Each page is oldest first; prepend so `seen` stays chronological.
    let mut ids: Vec<_> = page.items.iter().map(|m| m.id.clone()).collect();
    ids.extend(seen);
    seen = ids;
    if !page.has_more {
      break;
    }
    cursor = page.cursor;
  }

  assert_eq!(sizes, [2, 2, 1]);
  assert_eq!(seen, ["m1", "m2", "m3", "m4", "m5"]);
}

#[tokio::test]
async fn first_page_is_newest_messages_oldest_first() {
  let s = store().await;
  s.upsert_messages((1..=5).map(|i| inbound(&format!("m{i}"), "+2", i)).collect())
    .await
    .unwrap();

  let page = s.list_messages(&me(), "+2", 3, None).await.unwrap();
  let ids: Vec<_> = page.iter().map(|m| m.id.as_str()).collect();
  assert_eq!(ids, ["m3", "m4", "m5"]);
}

#[tokio::test]
async fn cursor_excludes_its_own_position() {
  let s = store().await;
  s.upsert_messages(vec![inbound("a", "+2", 100), inbound("b", "+2", 200)])
    .await
    .unwrap();

  let cursor = Cursor { timestamp: 200, id: "b".into() };
  let page = s.list_messages(&me(), "+2", 10, Some(&cursor)).await.unwrap();
  let ids: Vec<_> = page.iter().map(|m| m.id.as_str()).collect();
  assert_eq!(ids, ["a"]);
}

#[tokio::test]
async fn paging_splits_same_timestamp_messages_by_id() {
  let s = store().await;
  s.upsert_messages(vec![
    inbound("a", "+2", 1000),
    inbound("b", "+2", 2000),
    inbound("c", "+2", 2000),
  ])
  .await
  .unwrap();

  let mut cursor: Option<Cursor> = None;
  let mut seen = Vec::new();
  loop {
    let req = PageRequest::new(cursor, Some(1)).unwrap();
    let items = s
      .list_messages(&me(), "+2", req.limit, req.before())
      .await
      .unwrap();
    let page = Paginated::of_messages(items, &req);
    if page.items.is_empty() {
      break;
    }
    seen.extend(page.items.iter().map(|m| m.id.clone()));
    cursor = page.cursor;
  }

  assert_eq!(seen, ["c", "b", "a"]);
}

#[tokio::test]
async fn unknown_thread_has_no_messages() {
  let s = store().await;
  assert!(s.list_messages(&me(), "+9", 10, None).await.unwrap().is_empty());
}

// ─── Persistence ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn file_cache_survives_reopen_and_creates_directories() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("accounts").join("cache.sqlite3");

  {
    let s = SqliteStore::open(&path).await.unwrap();
    s.upsert_messages(vec![inbound("a", "+2", 100)]).await.unwrap();
    s.mark_read("+2", 100).await.unwrap();
  }

  let reopened = SqliteStore::open(&path).await.unwrap();
  let record = reopened.get_message("a").await.unwrap().unwrap();
  assert!(record.is_read);
  assert_eq!(reopened.watermark().await.unwrap(), Some(100));
}

#[tokio::test]
async fn newer_schema_is_rejected() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("cache.sqlite3");

  {
    let conn = rusqlite::Connection::open(&path).unwrap();
    conn.pragma_update(None, "user_version", 99).unwrap();
  }

  let result = SqliteStore::open(&path).await;
  assert!(matches!(result, Err(Error::UnsupportedSchema { found: 99, .. })));
}
