//! Handler for `GET /messages/{id}`.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use twine_core::{message::Message, source::RemoteSource, store::MessageStore};

use crate::{error::ApiError, facade::Facade};

/// `GET /messages/{id}`
pub async fn get_one<S, R>(
  State(facade): State<Arc<Facade<S, R>>>,
  Path(id): Path<String>,
) -> Result<Json<Message>, ApiError>
where
  S: MessageStore,
  R: RemoteSource,
{
  let message = facade
    .get_message(&id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("message {id} not found")))?;
  Ok(Json(message))
}
