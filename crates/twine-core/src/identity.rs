//! Stable pseudonymous identifiers for phone numbers.
//!
//! The provider exposes nothing richer than a phone number for either side of
//! a conversation, so both the local account and every counterpart are
//! identified by a SHA-256 digest of their number. The digest is pure: the
//! same number yields the same identifier across processes and restarts.

use sha2::{Digest, Sha256};

/// Derive the opaque participant identifier for `phone_number`.
pub fn participant_id(phone_number: &str) -> String {
  hex::encode(Sha256::digest(phone_number.as_bytes()))
}
