//! Error type for `twine-twilio`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A session field was empty; no client can be built without it.
  #[error("missing Twilio credential: {0}")]
  MissingCredentials(&'static str),

  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("Twilio returned {status}: {body}")]
  Status {
    status: reqwest::StatusCode,
    body:   String,
  },

  #[error("unparseable Twilio timestamp {value:?}: {source}")]
  Timestamp {
    value:  String,
    #[source]
    source: chrono::ParseError,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
