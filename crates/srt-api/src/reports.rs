//! Handlers for `/reports` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`    | `/reports` | Optional `?search=` over name and description |
//! | `POST`   | `/reports` | Body: [`NewReport`]; returns 201 |
//! | `GET`    | `/reports/{id}` | 404 if not found |
//! | `DELETE` | `/reports/{id}` | Also deletes the report's histories |
//! | `POST`   | `/reports/{id}/launch` | Body: `{"start":"2024-01-01","end":"2024-01-31"}`; returns 202 |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::NaiveDate;
use serde::Deserialize;
use srt_core::{
  report::{DateRange, NewReport, Report},
  store::BackofficeStore,
  task::JobRunner,
};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub search: Option<String>,
}

/// `GET /reports[?search=<text>]`
pub async fn list<S: BackofficeStore, R: JobRunner>(
  State(launcher): State<AppState<S, R>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Report>>, ApiError> {
  let reports = launcher
    .store()
    .list_reports(params.search)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(reports))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /reports`
pub async fn create<S: BackofficeStore, R: JobRunner>(
  State(launcher): State<AppState<S, R>>,
  Json(body): Json<NewReport>,
) -> Result<impl IntoResponse, ApiError> {
  if body.name.trim().is_empty() {
    return Err(ApiError::BadRequest("report name must not be empty".into()));
  }
  let report = launcher
    .store()
    .add_report(body)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(report)))
}

// ─── Get / delete one ─────────────────────────────────────────────────────────

/// `GET /reports/{id}`
pub async fn get_one<S: BackofficeStore, R: JobRunner>(
  State(launcher): State<AppState<S, R>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Report>, ApiError> {
  let report = launcher
    .store()
    .get_report(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("report {id} not found")))?;
  Ok(Json(report))
}

/// `DELETE /reports/{id}`
pub async fn delete_one<S: BackofficeStore, R: JobRunner>(
  State(launcher): State<AppState<S, R>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  let deleted = launcher
    .store()
    .delete_report(id)
    .await
    .map_err(ApiError::store)?;
  if !deleted {
    return Err(ApiError::NotFound(format!("report {id} not found")));
  }
  tracing::info!(report_id = %id, "deleted report");
  Ok(StatusCode::NO_CONTENT)
}

// ─── Launch ───────────────────────────────────────────────────────────────────

/// Optional date range for a launch. It only applies when both bounds are
/// given.
#[derive(Debug, Default, Deserialize)]
pub struct LaunchBody {
  #[serde(default)]
  pub start: Option<NaiveDate>,
  #[serde(default)]
  pub end:   Option<NaiveDate>,
}

/// `POST /reports/{id}/launch`, returning the new pending report history.
pub async fn launch<S: BackofficeStore, R: JobRunner>(
  State(launcher): State<AppState<S, R>>,
  Path(id): Path<Uuid>,
  Json(body): Json<LaunchBody>,
) -> Result<impl IntoResponse, ApiError> {
  let range = DateRange::from_bounds(body.start, body.end);
  if range.is_some_and(|r| r.start > r.end) {
    return Err(ApiError::BadRequest("start must not be after end".into()));
  }
  let history = launcher.launch_report(id, range).await?;
  Ok((StatusCode::ACCEPTED, Json(history)))
}
