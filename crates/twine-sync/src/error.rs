//! Error type for `twine-sync`.

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  /// The provider call failed. Transient; the loop backs off and retries.
  #[error("remote source error: {0}")]
  Source(#[source] BoxError),

  /// The local cache failed. Fatal to the cycle in progress.
  #[error("store error: {0}")]
  Store(#[source] BoxError),
}

impl Error {
  pub(crate) fn remote<E: std::error::Error + Send + Sync + 'static>(e: E) -> Self {
    Self::Source(Box::new(e))
  }

  pub(crate) fn cache<E: std::error::Error + Send + Sync + 'static>(e: E) -> Self {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
