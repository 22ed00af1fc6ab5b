//! [`SqliteStore`], the SQLite implementation of [`MessageStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;
use tracing::{debug, info};

use twine_core::{
  message::{Message, MessageRecord},
  page::Cursor,
  projection::{to_message_views, to_thread_views},
  store::MessageStore,
  thread::{Thread, User},
};

use crate::{
  Error, Result,
  encode::{encode_limit, record_from_row},
  schema::{MIGRATIONS, RECORD_COLUMNS, SCHEMA_VERSION, UPSERT_MESSAGE},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A message cache backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. Every call
/// goes through the one connection thread, so reads and writes from the sync
/// engine and from host queries are serialised.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a cache at `path` and bring its schema up to date.
  ///
  /// Missing parent directories are created.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    if let Some(dir) = path.parent()
      && !dir.as_os_str().is_empty()
    {
      tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| Error::CreateDir { path: dir.to_path_buf(), source })?;
    }

    info!(path = %path.display(), "opening message cache");
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.migrate().await?;
    Ok(store)
  }

  /// Open an in-memory cache, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.migrate().await?;
    Ok(store)
  }

  async fn migrate(&self) -> Result<()> {
    let found: i64 = self
      .conn
      .call(|conn| Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?))
      .await?;

    if found > SCHEMA_VERSION {
      return Err(Error::UnsupportedSchema { found, supported: SCHEMA_VERSION });
    }
    if found == SCHEMA_VERSION {
      return Ok(());
    }

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        for (version, sql) in MIGRATIONS.iter().enumerate().skip(found as usize) {
          tx.execute_batch(sql)?;
          tx.pragma_update(None, "user_version", version as i64 + 1)?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    info!(from = found, to = SCHEMA_VERSION, "migrated message cache schema");
    Ok(())
  }

  /// Total number of cached messages.
  pub async fn message_count(&self) -> Result<usize> {
    let count: i64 = self
      .conn
      .call(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM messages", [], |r| r.get(0))?))
      .await?;
    Ok(count as usize)
  }
}

// ─── MessageStore impl ───────────────────────────────────────────────────────

impl MessageStore for SqliteStore {
  type Error = Error;

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn upsert_messages(&self, records: Vec<MessageRecord>) -> Result<Vec<MessageRecord>> {
    if records.is_empty() {
      return Ok(Vec::new());
    }
    let total = records.len();

    let inserted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut inserted = Vec::new();
        {
          let mut known = tx.prepare_cached(r#"SELECT 1 FROM messages WHERE "id" = ?1"#)?;
          let mut upsert = tx.prepare_cached(UPSERT_MESSAGE)?;
          for record in records {
            let existed = known.exists(rusqlite::params![record.id])?;
            upsert.execute(rusqlite::params![
              record.id,
              record.body,
              record.other_participant,
              record.is_sender,
              record.is_read,
              record.timestamp,
            ])?;
            if !existed {
              inserted.push(record);
            }
          }
        }
        tx.commit()?;
        Ok(inserted)
      })
      .await?;

    debug!(total, new = inserted.len(), "upserted messages");
    Ok(inserted)
  }

  async fn mark_read(&self, thread_id: &str, upto: i64) -> Result<usize> {
    let thread_id = thread_id.to_owned();

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          r#"UPDATE messages SET "isRead" = TRUE
             WHERE "otherParticipant" = ?1
               AND "timestamp" <= ?2
               AND "isRead" = FALSE"#,
          rusqlite::params![thread_id, upto],
        )?)
      })
      .await?;

    Ok(changed)
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn watermark(&self) -> Result<Option<i64>> {
    let max: Option<i64> = self
      .conn
      .call(|conn| {
        Ok(conn.query_row(r#"SELECT MAX("timestamp") FROM messages"#, [], |r| r.get(0))?)
      })
      .await?;
    Ok(max)
  }

  async fn list_threads(&self, current_user: &User) -> Result<Vec<Thread>> {
    let records: Vec<MessageRecord> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!("SELECT {RECORD_COLUMNS} FROM messages"))?;
        let rows = stmt
          .query_map([], record_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(to_thread_views(records, current_user))
  }

  async fn list_messages(
    &self,
    current_user: &User,
    thread_id:    &str,
    limit:        usize,
    before:       Option<&Cursor>,
  ) -> Result<Vec<Message>> {
    let thread_id = thread_id.to_owned();
    let limit_val = encode_limit(limit);
    let before_ts = before.map(|c| c.timestamp);
    let before_id = before.map(|c| c.id.clone());

    let mut records: Vec<MessageRecord> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          r#"SELECT {RECORD_COLUMNS} FROM messages
             WHERE "otherParticipant" = ?1
               AND (?2 IS NULL
                    OR "timestamp" < ?2
                    OR ("timestamp" = ?2 AND "id" < ?3))
             ORDER BY "timestamp" DESC, "id" DESC
             LIMIT ?4"#
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![thread_id, before_ts, before_id, limit_val],
            record_from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    // Selected newest first so LIMIT keeps the right end; hand back oldest
    // first.
    records.reverse();
    Ok(to_message_views(&records, current_user))
  }

  async fn get_message(&self, id: &str) -> Result<Option<MessageRecord>> {
    let id = id.to_owned();

    let record = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(r#"SELECT {RECORD_COLUMNS} FROM messages WHERE "id" = ?1"#),
            rusqlite::params![id],
            record_from_row,
          )
          .optional()?)
      })
      .await?;

    Ok(record)
  }
}
