//! Handlers for `/sync` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/sync/status` | 404 if no engine is attached |
//! | `POST` | `/sync/resume` | `{"resumed": bool}` |

use std::sync::Arc;

use axum::{Json, extract::State};
use serde_json::{Value, json};
use twine_core::{source::RemoteSource, store::MessageStore};
use twine_sync::SyncStatus;

use crate::{error::ApiError, facade::Facade};

/// `GET /sync/status`
pub async fn status<S, R>(
  State(facade): State<Arc<Facade<S, R>>>,
) -> Result<Json<SyncStatus>, ApiError>
where
  S: MessageStore,
  R: RemoteSource,
{
  facade
    .sync_status()
    .map(Json)
    .ok_or_else(|| ApiError::NotFound("sync is not running".to_owned()))
}

/// `POST /sync/resume`: the host came back to the foreground.
pub async fn resume<S, R>(State(facade): State<Arc<Facade<S, R>>>) -> Json<Value>
where
  S: MessageStore,
  R: RemoteSource,
{
  Json(json!({ "resumed": facade.resume() }))
}
