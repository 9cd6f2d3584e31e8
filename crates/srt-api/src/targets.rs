//! Handlers for `/targets` endpoints. Passwords are accepted on create and
//! never returned.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use srt_core::{
  store::BackofficeStore,
  target::{NewTarget, Target},
  task::JobRunner,
};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

/// `GET /targets`, ordered by name.
pub async fn list<S: BackofficeStore, R: JobRunner>(
  State(launcher): State<AppState<S, R>>,
) -> Result<Json<Vec<Target>>, ApiError> {
  let targets = launcher.store().list_targets().await.map_err(ApiError::store)?;
  Ok(Json(targets))
}

/// `POST /targets`
pub async fn create<S: BackofficeStore, R: JobRunner>(
  State(launcher): State<AppState<S, R>>,
  Json(body): Json<NewTarget>,
) -> Result<impl IntoResponse, ApiError> {
  if body.name.trim().is_empty() {
    return Err(ApiError::BadRequest("target name must not be empty".into()));
  }
  let target = launcher.store().add_target(body).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(target)))
}

/// `GET /targets/{id}`
pub async fn get_one<S: BackofficeStore, R: JobRunner>(
  State(launcher): State<AppState<S, R>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Target>, ApiError> {
  let target = launcher
    .store()
    .get_target(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("target {id} not found")))?;
  Ok(Json(target))
}

/// `DELETE /targets/{id}`. Deliveries to the target stay, without a target.
pub async fn delete_one<S: BackofficeStore, R: JobRunner>(
  State(launcher): State<AppState<S, R>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  if !launcher.store().delete_target(id).await.map_err(ApiError::store)? {
    return Err(ApiError::NotFound(format!("target {id} not found")));
  }
  Ok(StatusCode::NO_CONTENT)
}
