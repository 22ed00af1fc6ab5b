//! Row decoding between SQLite and [`MessageRecord`].
//!
//! Booleans are stored as SQLite integers (0/1) and timestamps as epoch
//! milliseconds, so every column maps directly onto a Rust primitive.

use twine_core::message::MessageRecord;

/// Read a full record from a row selected with
/// [`RECORD_COLUMNS`](crate::schema::RECORD_COLUMNS).
pub fn record_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MessageRecord> {
  Ok(MessageRecord {
    id:                row.get(0)?,
    body:              row.get(1)?,
    other_participant: row.get(2)?,
    is_sender:         row.get(3)?,
    is_read:           row.get(4)?,
    timestamp:         row.get(5)?,
  })
}

/// SQLite has no unsigned 64-bit integers; clamp page sizes into range.
pub fn encode_limit(limit: usize) -> i64 { i64::try_from(limit).unwrap_or(i64::MAX) }
