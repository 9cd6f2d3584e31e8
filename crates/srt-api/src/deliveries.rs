//! Handlers for `/deliveries` endpoints.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `GET`   | `/deliveries` | Optional `?report=<id>`; newest first |
//! | `POST`  | `/deliveries` | Body: [`NewDelivery`]; report and target must exist |
//! | `GET`   | `/deliveries/{id}` | Adds the computed `where` and `fullpath` |
//! | `PATCH` | `/deliveries/{id}` | Body: `{"is_active":false}` |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use srt_core::{
  delivery::{Delivery, NewDelivery},
  store::BackofficeStore,
  task::JobRunner,
};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

/// A delivery with the destination derived from its target, when the target
/// still exists.
#[derive(Debug, Serialize)]
pub struct DeliveryView {
  #[serde(flatten)]
  pub delivery: Delivery,
  pub r#where:  Option<String>,
  pub fullpath: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub report: Option<Uuid>,
}

/// `GET /deliveries[?report=<id>]`
pub async fn list<S: BackofficeStore, R: JobRunner>(
  State(launcher): State<AppState<S, R>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Delivery>>, ApiError> {
  let deliveries = launcher
    .store()
    .list_deliveries(params.report)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(deliveries))
}

/// `POST /deliveries`
pub async fn create<S: BackofficeStore, R: JobRunner>(
  State(launcher): State<AppState<S, R>>,
  Json(body): Json<NewDelivery>,
) -> Result<impl IntoResponse, ApiError> {
  let store = launcher.store();
  if let Some(report_id) = body.report_id {
    if store.get_report(report_id).await.map_err(ApiError::store)?.is_none() {
      return Err(ApiError::BadRequest(format!("report {report_id} does not exist")));
    }
  }
  if let Some(target_id) = body.target_id {
    if store.get_target(target_id).await.map_err(ApiError::store)?.is_none() {
      return Err(ApiError::BadRequest(format!("target {target_id} does not exist")));
    }
  }
  let delivery = store.add_delivery(body).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(delivery)))
}

/// `GET /deliveries/{id}`
pub async fn get_one<S: BackofficeStore, R: JobRunner>(
  State(launcher): State<AppState<S, R>>,
  Path(id): Path<Uuid>,
) -> Result<Json<DeliveryView>, ApiError> {
  let store = launcher.store();
  let delivery = store
    .get_delivery(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("delivery {id} not found")))?;

  let target = match delivery.target_id {
    Some(target_id) => store.get_target(target_id).await.map_err(ApiError::store)?,
    None => None,
  };
  Ok(Json(DeliveryView {
    r#where:  target.as_ref().map(|t| t.location().to_owned()),
    fullpath: target.as_ref().map(|t| delivery.fullpath(t)),
    delivery,
  }))
}

#[derive(Debug, Deserialize)]
pub struct ActivationBody {
  pub is_active: bool,
}

/// `PATCH /deliveries/{id}`
pub async fn set_active<S: BackofficeStore, R: JobRunner>(
  State(launcher): State<AppState<S, R>>,
  Path(id): Path<Uuid>,
  Json(body): Json<ActivationBody>,
) -> Result<Json<Delivery>, ApiError> {
  let delivery = launcher
    .store()
    .set_delivery_active(id, body.is_active)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("delivery {id} not found")))?;
  Ok(Json(delivery))
}
