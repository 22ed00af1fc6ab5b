//! Handlers for `/threads` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/threads` | All threads in one page |
//! | `GET`  | `/threads/{id}/messages` | Optional `?cursor=<token>&limit=<n>` |
//! | `POST` | `/threads/{id}/messages` | Body: `{"text":"..."}`; returns 201 + message |
//! | `POST` | `/threads/{id}/read` | Body: `{"message_id":"..."}` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use twine_core::{
  message::Message,
  page::{Cursor, PageRequest, Paginated},
  source::RemoteSource,
  store::MessageStore,
  thread::Thread,
};

use crate::{
  error::ApiError,
  facade::{Facade, ReadReceipt},
};

// ─── List threads ─────────────────────────────────────────────────────────────

/// `GET /threads`
pub async fn list<S, R>(
  State(facade): State<Arc<Facade<S, R>>>,
) -> Result<Json<Paginated<Thread>>, ApiError>
where
  S: MessageStore,
  R: RemoteSource,
{
  Ok(Json(facade.list_threads().await?))
}

// ─── List messages ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PageParams {
  /// The `cursor` of the previous page.
  pub cursor: Option<String>,
  pub limit:  Option<usize>,
}

/// `GET /threads/{id}/messages[?cursor=<token>][&limit=<n>]`
pub async fn messages<S, R>(
  State(facade): State<Arc<Facade<S, R>>>,
  Path(thread_id): Path<String>,
  Query(params): Query<PageParams>,
) -> Result<Json<Paginated<Message>>, ApiError>
where
  S: MessageStore,
  R: RemoteSource,
{
  let cursor = params.cursor.as_deref().map(str::parse::<Cursor>).transpose()?;
  let request = PageRequest::new(cursor, params.limit)?;
  Ok(Json(facade.list_messages(&thread_id, request).await?))
}

// ─── Send ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SendBody {
  pub text: String,
}

/// `POST /threads/{id}/messages`, body: `{"text":"..."}`
pub async fn send<S, R>(
  State(facade): State<Arc<Facade<S, R>>>,
  Path(thread_id): Path<String>,
  Json(body): Json<SendBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: MessageStore,
  R: RemoteSource,
{
  let message = facade.send_message(&thread_id, &body.text).await?;
  Ok((StatusCode::CREATED, Json(message)))
}

// ─── Mark read ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ReadBody {
  pub message_id: String,
}

/// `POST /threads/{id}/read`, body: `{"message_id":"..."}`
pub async fn mark_read<S, R>(
  State(facade): State<Arc<Facade<S, R>>>,
  Path(thread_id): Path<String>,
  Json(body): Json<ReadBody>,
) -> Result<Json<ReadReceipt>, ApiError>
where
  S: MessageStore,
  R: RemoteSource,
{
  Ok(Json(facade.mark_read(&thread_id, &body.message_id).await?))
}
