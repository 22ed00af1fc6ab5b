//! twine server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), logs in to
//! the configured Twilio account, opens that account's cache, keeps it in
//! step with the provider, and serves the JSON API over HTTP.
//!
//! Every key can be overridden from the environment, e.g.
//! `TWINE_ACCOUNT__TOKEN` or `TWINE_SYNC__POLL_INTERVAL_MS`.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use axum::Router;
use clap::Parser;
use tokio::{net::TcpListener, sync::broadcast};
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use twine_core::{event::ThreadEvent, source::RemoteSource};
use twine_server::{Facade, ServerConfig};
use twine_store_sqlite::SqliteStore;
use twine_sync::SyncEngine;
use twine_twilio::TwilioClient;

#[derive(Parser)]
#[command(author, version, about = "twine SMS mirror")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(
      config::Environment::with_prefix("TWINE")
        .prefix_separator("_")
        .separator("__"),
    )
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Log in. Nothing is polled without a session.
  let client = TwilioClient::login(server_cfg.account.clone())
    .context("failed to log in to Twilio")?;
  let current_user = client.current_user();

  // One cache file per account.
  let store_path = expand_tilde(&server_cfg.store_dir).join(format!("{}.sqlite3", current_user.id));
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let store = Arc::new(store);
  let source = Arc::new(client);

  // Start syncing.
  let engine = SyncEngine::new(store.clone(), source.clone(), server_cfg.sync.clone());
  let events = engine.subscribe();
  let sync = engine.start().await.context("failed to start sync")?;
  tokio::spawn(log_events(events));

  let facade = Arc::new(Facade::new(store, source).with_sync(sync.clone()));
  let app = Router::new()
    .nest("/api", twine_server::router(facade))
    .layer(TraceLayer::new_for_http());
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!(number = %current_user.phone_number, "Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  sync.dispose().await;
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(error = %e, "failed to listen for shutdown signal");
    std::future::pending::<()>().await;
  }
  tracing::info!("Received shutdown signal");
}

/// Report thread changes as they land.
async fn log_events(mut events: broadcast::Receiver<ThreadEvent>) {
  loop {
    match events.recv().await {
      Ok(event) => tracing::info!(
        thread = %event.thread_id,
        count = event.messages.len(),
        "new messages"
      ),
      Err(broadcast::error::RecvError::Lagged(skipped)) => {
        tracing::warn!(skipped, "event log fell behind");
      }
      Err(broadcast::error::RecvError::Closed) => break,
    }
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
