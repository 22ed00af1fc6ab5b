//! The `RemoteSource` trait, the provider side of synchronisation.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{message::RawMessage, thread::User};

/// A provider-hosted message log for a single phone number.
pub trait RemoteSource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// The account this source is logged in as. Its `id` is the participant
  /// hash of its phone number.
  fn current_user(&self) -> User;

  /// Every message sent from or to the account's number, oldest first.
  ///
  /// With `since`, at least every message created at or after that instant
  /// is returned; older ones may be included. Without it, the whole history.
  fn messages_of_number(
    &self,
    since: Option<DateTime<Utc>>,
  ) -> impl Future<Output = Result<Vec<RawMessage>, Self::Error>> + Send + '_;

  /// Send `text` to `to` and return the provider's record of it.
  fn send_message<'a>(
    &'a self,
    to: &'a str,
    text: &'a str,
  ) -> impl Future<Output = Result<RawMessage, Self::Error>> + Send + 'a;
}
