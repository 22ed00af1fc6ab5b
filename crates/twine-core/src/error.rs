//! Error types for `twine-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid page cursor: {0:?}")]
  InvalidCursor(String),

  #[error("page limit must be at least 1")]
  ZeroLimit,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
