//! Participants and the derived conversation view.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{identity::participant_id, message::Message};

/// One side of a conversation. The provider knows nothing about people beyond
/// their number, so a user is a number plus its derived identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub id:           String,
  pub phone_number: String,
  pub display_name: String,
  /// `true` for the account the cache belongs to.
  pub is_self:      bool,
}

impl User {
  /// The local account. An empty `display_name` falls back to the number.
  pub fn current(phone_number: &str, display_name: Option<&str>) -> Self {
    let display_name = display_name
      .filter(|n| !n.is_empty())
      .unwrap_or(phone_number)
      .to_owned();
    Self {
      id: participant_id(phone_number),
      phone_number: phone_number.to_owned(),
      display_name,
      is_self: true,
    }
  }

  /// A counterpart synthesised from nothing but their number.
  pub fn counterpart(phone_number: &str) -> Self {
    Self {
      id:           participant_id(phone_number),
      phone_number: phone_number.to_owned(),
      display_name: phone_number.to_owned(),
      is_self:      false,
    }
  }
}

/// A pairwise conversation, computed on read from every stored record that
/// shares a counterpart. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thread {
  /// The thread key: the counterpart's phone number.
  pub id:                   String,
  pub title:                String,
  pub is_unread:            bool,
  /// Id of the newest message marked read, if any.
  pub last_read_message_id: Option<String>,
  /// The local account first, then the counterpart.
  pub participants:         Vec<User>,
  /// Oldest first.
  pub messages:             Vec<Message>,
  /// Timestamp of the newest message.
  pub last_activity:        DateTime<Utc>,
}
