//! SQL schema for the twine SQLite cache.
//!
//! The schema version lives in `PRAGMA user_version`. `MIGRATIONS[n]` moves a
//! database from version `n` to `n + 1`; a fresh file starts at version 0.

/// Ordered schema migrations.
pub const MIGRATIONS: &[&str] = &[
  // 0 → 1: the message log.
  r#"
CREATE TABLE IF NOT EXISTS messages (
    "id"               TEXT    NOT NULL PRIMARY KEY,   -- provider-assigned
    "body"             TEXT    NOT NULL,
    "otherParticipant" TEXT    NOT NULL,               -- thread key
    "isSender"         BOOLEAN NOT NULL,
    "isRead"           BOOLEAN NOT NULL DEFAULT FALSE,
    "timestamp"        INTEGER NOT NULL                -- epoch milliseconds
);

CREATE INDEX IF NOT EXISTS messages_thread_idx    ON messages("otherParticipant", "timestamp");
CREATE INDEX IF NOT EXISTS messages_timestamp_idx ON messages("timestamp");
"#,
];

/// The version a fully migrated database reports.
pub const SCHEMA_VERSION: i64 = MIGRATIONS.len() as i64;

/// Insert-or-replace keyed by id. A read flag, once set, survives any later
/// upsert of the same id.
pub const UPSERT_MESSAGE: &str = r#"
INSERT INTO messages ("id", "body", "otherParticipant", "isSender", "isRead", "timestamp")
VALUES (?1, ?2, ?3, ?4, ?5, ?6)
ON CONFLICT ("id") DO UPDATE SET
    "body"             = excluded."body",
    "otherParticipant" = excluded."otherParticipant",
    "isSender"         = excluded."isSender",
    "isRead"           = messages."isRead" OR excluded."isRead",
    "timestamp"        = excluded."timestamp"
"#;

/// Column list shared by every query that reads whole records.
pub const RECORD_COLUMNS: &str =
  r#""id", "body", "otherParticipant", "isSender", "isRead", "timestamp""#;
