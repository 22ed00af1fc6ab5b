//! Cursor pagination over thread messages.
//!
//! The provider exposes no stable cursors, so paging is resolved entirely
//! against the local cache. A cursor is the position of the oldest message
//! the caller has already received: its timestamp, with its id breaking ties
//! between messages created in the same millisecond. The next page holds
//! messages strictly before that position in `(timestamp, id)` order.
//!
//! `has_more` is reported whenever a page comes back full. When the remaining
//! tail is exactly one page long this claims more than there is, and the
//! caller's next request returns an empty page.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, Result, message::Message};

/// Page size used when the caller does not ask for one.
pub const DEFAULT_PAGE_LIMIT: usize = 50;

/// Exclusive page boundary, rendered as `<epoch-ms>:<message id>`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Cursor {
  pub timestamp: i64,
  pub id:        String,
}

impl Cursor {
  /// The position of `message`.
  pub fn at(message: &Message) -> Self {
    Self { timestamp: message.timestamp.timestamp_millis(), id: message.id.clone() }
  }
}

impl fmt::Display for Cursor {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.timestamp, self.id)
  }
}

impl FromStr for Cursor {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    let invalid = || Error::InvalidCursor(s.to_owned());
    let (timestamp, id) = s.trim().split_once(':').ok_or_else(invalid)?;
    if id.is_empty() {
      return Err(invalid());
    }
    let timestamp = timestamp.parse().map_err(|_| invalid())?;
    Ok(Self { timestamp, id: id.to_owned() })
  }
}

impl From<Cursor> for String {
  fn from(cursor: Cursor) -> Self { cursor.to_string() }
}

impl TryFrom<String> for Cursor {
  type Error = Error;

  fn try_from(s: String) -> Result<Self> { s.parse() }
}

/// A page request as received from the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
  pub cursor: Option<Cursor>,
  pub limit:  usize,
}

impl PageRequest {
  pub fn new(cursor: Option<Cursor>, limit: Option<usize>) -> Result<Self> {
    let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT);
    if limit == 0 {
      return Err(Error::ZeroLimit);
    }
    Ok(Self { cursor, limit })
  }

  /// The exclusive upper bound to hand to the store.
  pub fn before(&self) -> Option<&Cursor> { self.cursor.as_ref() }
}

impl Default for PageRequest {
  fn default() -> Self { Self { cursor: None, limit: DEFAULT_PAGE_LIMIT } }
}

/// One page of results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
  pub items:    Vec<T>,
  pub has_more: bool,
  /// Pass back to fetch the next (older) page.
  pub cursor:   Option<Cursor>,
}

impl<T> Paginated<T> {
  /// Everything in one page; nothing more to fetch.
  pub fn complete(items: Vec<T>) -> Self { Self { items, has_more: false, cursor: None } }
}

impl Paginated<Message> {
  /// Wrap a page of messages (oldest first) fetched with `request`.
  pub fn of_messages(items: Vec<Message>, request: &PageRequest) -> Self {
    let has_more = items.len() >= request.limit;
    let cursor = items.first().map(Cursor::at);
    Self { items, has_more, cursor }
  }
}

#[cfg(test)]
mod tests {
  use chrono::{TimeZone, Utc};

  use super::*;

  fn message(id: &str, millis: i64) -> Message {
    Message {
      id:        id.into(),
      thread_id: "+2".into(),
      sender_id: "x".into(),
      text:      String::new(),
      timestamp: Utc.timestamp_millis_opt(millis).unwrap(),
      is_sender: false,
      is_read:   false,
    }
  }

  #[test]
  fn cursor_parses_and_displays() {
    let cursor: Cursor = "1700000000000:SM42".parse().unwrap();
    assert_eq!(cursor, Cursor { timestamp: 1_700_000_000_000, id: "SM42".into() });
    assert_eq!(cursor.to_string(), "1700000000000:SM42");
  }

  #[test]
  fn garbage_cursor_is_rejected() {
    for bad in ["yesterday", "1700000000000", "1700000000000:", "soon:SM1"] {
      assert!(matches!(bad.parse::<Cursor>(), Err(Error::InvalidCursor(_))), "{bad}");
    }
  }

  #[test]
  fn zero_limit_is_rejected() {
    assert!(matches!(PageRequest::new(None, Some(0)), Err(Error::ZeroLimit)));
  }

  #[test]
  fn default_limit_applies() {
    assert_eq!(PageRequest::new(None, None).unwrap().limit, DEFAULT_PAGE_LIMIT);
  }

  #[test]
  fn full_page_reports_more_and_oldest_cursor() {
    let req = PageRequest::new(None, Some(2)).unwrap();
    let page = Paginated::of_messages(vec![message("a", 10), message("b", 20)], &req);
    assert!(page.has_more);
    assert_eq!(page.cursor, Some(Cursor { timestamp: 10, id: "a".into() }));
  }

  #[test]
  fn short_page_reports_no_more() {
    let req = PageRequest::new(None, Some(2)).unwrap();
    let page = Paginated::of_messages(vec![message("a", 10)], &req);
    assert!(!page.has_more);

    let empty = Paginated::of_messages(Vec::new(), &req);
    assert!(!empty.has_more);
    assert_eq!(empty.cursor, None);
  }

  #[test]
  fn cursor_serialises_as_token() {
    let cursor = Cursor { timestamp: 10, id: "a".into() };
    assert_eq!(serde_json::to_value(&cursor).unwrap(), "10:a");
    let back: Cursor = serde_json::from_value("10:a".into()).unwrap();
    assert_eq!(back, cursor);
  }
}
