//! JSON API over a twine message cache.
//!
//! Exposes an axum [`Router`] backed by a [`Facade`] over any
//! [`MessageStore`] and [`RemoteSource`]. Auth, TLS, and transport concerns
//! are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", twine_server::router(facade.clone()))
//! ```

pub mod error;
pub mod facade;
pub mod handlers;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post},
};
use serde::Deserialize;
use twine_core::{source::RemoteSource, store::MessageStore};
use twine_sync::SyncConfig;
use twine_twilio::Credentials;

pub use error::ApiError;
pub use facade::{Facade, ReadReceipt};

use handlers::{account, messages, sync, threads};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `TWINE_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:      String,
  #[serde(default = "default_port")]
  pub port:      u16,
  /// Directory holding one cache file per account.
  #[serde(default = "default_store_dir")]
  pub store_dir: PathBuf,
  #[serde(default)]
  pub account:   Credentials,
  #[serde(default)]
  pub sync:      SyncConfig,
}

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 5233 }

fn default_store_dir() -> PathBuf { PathBuf::from("~/.local/share/twine") }

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `facade`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn router<S, R>(facade: Arc<Facade<S, R>>) -> Router<()>
where
  S: MessageStore + 'static,
  R: RemoteSource + 'static,
{
  Router::new()
    // Account
    .route("/me", get(account::me::<S, R>))
    // Threads
    .route("/threads", get(threads::list::<S, R>))
    .route(
      "/threads/{id}/messages",
      get(threads::messages::<S, R>).post(threads::send::<S, R>),
    )
    .route("/threads/{id}/read", post(threads::mark_read::<S, R>))
    // Messages
    .route("/messages/{id}", get(messages::get_one::<S, R>))
    // Sync
    .route("/sync/status", get(sync::status::<S, R>))
    .route("/sync/resume", post(sync::resume::<S, R>))
    .with_state(facade)
}

// ─── Integration tests ────────────────────────────────────────────────────────
