//! JSON admin API for the report backoffice.
//!
//! Exposes an axum [`Router`] over any [`BackofficeStore`], with report
//! launches and delivery relaunches going through a [`Launcher`]. Auth, TLS,
//! and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api/v1", srt_api::api_router(launcher.clone()))
//! ```

pub mod deliveries;
pub mod error;
pub mod histories;
pub mod reports;
pub mod targets;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use srt_core::{store::BackofficeStore, task::JobRunner};
use srt_dispatch::Launcher;

pub use error::ApiError;

/// Handler state: the launcher, which also hands out the store.
pub type AppState<S, R> = Arc<Launcher<S, R>>;

/// Build a fully-materialised API router.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, R>(launcher: AppState<S, R>) -> Router<()>
where
  S: BackofficeStore + 'static,
  R: JobRunner + 'static,
{
  Router::new()
    // Reports
    .route("/reports", get(reports::list::<S, R>).post(reports::create::<S, R>))
    .route(
      "/reports/{id}",
      get(reports::get_one::<S, R>).delete(reports::delete_one::<S, R>),
    )
    .route("/reports/{id}/launch", post(reports::launch::<S, R>))
    // Report histories
    .route("/report-histories", get(histories::list_reports::<S, R>))
    .route("/report-histories/{id}", get(histories::get_report::<S, R>))
    // Targets
    .route("/targets", get(targets::list::<S, R>).post(targets::create::<S, R>))
    .route(
      "/targets/{id}",
      get(targets::get_one::<S, R>).delete(targets::delete_one::<S, R>),
    )
    // Deliveries
    .route(
      "/deliveries",
      get(deliveries::list::<S, R>).post(deliveries::create::<S, R>),
    )
    .route(
      "/deliveries/{id}",
      get(deliveries::get_one::<S, R>).patch(deliveries::set_active::<S, R>),
    )
    // Delivery histories
    .route("/delivery-histories", get(histories::list_deliveries::<S, R>))
    .route(
      "/delivery-histories/{id}/relaunch",
      post(histories::relaunch::<S, R>),
    )
    .with_state(launcher)
}
