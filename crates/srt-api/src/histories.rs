//! Read-only history endpoints and the delivery relaunch action.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/report-histories` | Optional `?report=<id>`; newest first |
//! | `GET`  | `/report-histories/{id}` | 404 if not found |
//! | `GET`  | `/delivery-histories` | Optional `?delivery=<id>`; newest first |
//! | `POST` | `/delivery-histories/{id}/relaunch` | Returns 202 + the new attempt |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use srt_core::{
  history::{DeliveryHistory, ReportHistory},
  store::BackofficeStore,
  task::JobRunner,
};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct ReportFilter {
  pub report: Option<Uuid>,
}

/// `GET /report-histories[?report=<id>]`
pub async fn list_reports<S: BackofficeStore, R: JobRunner>(
  State(launcher): State<AppState<S, R>>,
  Query(filter): Query<ReportFilter>,
) -> Result<Json<Vec<ReportHistory>>, ApiError> {
  let histories = launcher
    .store()
    .list_report_histories(filter.report)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(histories))
}

/// `GET /report-histories/{id}`
pub async fn get_report<S: BackofficeStore, R: JobRunner>(
  State(launcher): State<AppState<S, R>>,
  Path(id): Path<Uuid>,
) -> Result<Json<ReportHistory>, ApiError> {
  let history = launcher
    .store()
    .get_report_history(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("report history {id} not found")))?;
  Ok(Json(history))
}

#[derive(Debug, Deserialize)]
pub struct DeliveryFilter {
  pub delivery: Option<Uuid>,
}

/// `GET /delivery-histories[?delivery=<id>]`
pub async fn list_deliveries<S: BackofficeStore, R: JobRunner>(
  State(launcher): State<AppState<S, R>>,
  Query(filter): Query<DeliveryFilter>,
) -> Result<Json<Vec<DeliveryHistory>>, ApiError> {
  let histories = launcher
    .store()
    .list_delivery_histories(filter.delivery)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(histories))
}

/// `POST /delivery-histories/{id}/relaunch`
pub async fn relaunch<S: BackofficeStore, R: JobRunner>(
  State(launcher): State<AppState<S, R>>,
  Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
  let history = launcher.relaunch_delivery(id).await?;
  Ok((StatusCode::ACCEPTED, Json(history)))
}
