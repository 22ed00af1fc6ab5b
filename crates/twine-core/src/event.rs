//! Change notifications published to the host.

use serde::{Deserialize, Serialize};

use crate::message::Message;

/// Newly observed messages for a single thread. Emitted only after the
/// messages have been persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadEvent {
  pub thread_id: String,
  /// Oldest first.
  pub messages:  Vec<Message>,
}
