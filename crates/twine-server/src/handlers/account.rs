//! Handler for `GET /me`.

use std::sync::Arc;

use axum::{Json, extract::State};
use twine_core::{source::RemoteSource, store::MessageStore, thread::User};

use crate::facade::Facade;

/// `GET /me`: the account this server mirrors.
pub async fn me<S, R>(State(facade): State<Arc<Facade<S, R>>>) -> Json<User>
where
  S: MessageStore,
  R: RemoteSource,
{
  Json(facade.current_user().clone())
}
