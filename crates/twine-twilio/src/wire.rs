//! Twilio's JSON representation of messages, and the merge of the two
//! directional listings into one ordered log.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use twine_core::message::RawMessage;

use crate::{Error, Result};

/// One page of `GET /Accounts/{sid}/Messages.json`.
#[derive(Debug, Deserialize)]
pub struct MessagePage {
  #[serde(default)]
  pub messages:      Vec<WireMessage>,
  /// Path (relative to the API host) of the next page, if any.
  pub next_page_uri: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WireMessage {
  pub sid:          String,
  #[serde(default)]
  pub body:         Option<String>,
  pub from:         String,
  pub to:           String,
  /// RFC 2822, e.g. `Thu, 30 Jul 2015 20:12:31 +0000`.
  pub date_created: String,
  pub date_sent:    Option<String>,
  pub status:       Option<String>,
}

impl WireMessage {
  pub fn into_raw(self) -> Result<RawMessage> {
    Ok(RawMessage {
      date_created: parse_date(&self.date_created)?,
      date_sent:    self.date_sent.as_deref().map(parse_date).transpose()?,
      sid:          self.sid,
      body:         self.body.unwrap_or_default(),
      from:         self.from,
      to:           self.to,
      status:       self.status,
    })
  }
}

fn parse_date(value: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc2822(value)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|source| Error::Timestamp { value: value.to_owned(), source })
}

/// Union the outbound and inbound listings: keep the first copy of each sid,
/// order by creation time.
///
/// Twilio's date filter is day-granular, so this may include messages from
/// before the requested bound. They are kept; the cache absorbs repeats.
pub fn merge(messages: impl IntoIterator<Item = RawMessage>) -> Vec<RawMessage> {
  let mut seen = HashSet::new();
  let mut merged: Vec<RawMessage> = messages
    .into_iter()
    .filter(|m| seen.insert(m.sid.clone()))
    .collect();
  merged.sort_by(|a, b| a.date_created.cmp(&b.date_created).then_with(|| a.sid.cmp(&b.sid)));
  merged
}
