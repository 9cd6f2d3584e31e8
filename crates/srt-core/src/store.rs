//! The `BackofficeStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `srt-store-sqlite`).
//! The dispatch pipeline and the admin API depend on this abstraction, not on
//! any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  delivery::{Delivery, NewDelivery},
  history::{DeliveryHistory, HistoryUpdate, NewReportHistory, ReportHistory},
  report::{NewReport, Report},
  target::{NewTarget, Target},
};

/// Abstraction over the relational persistence of the backoffice.
///
/// Configuration rows (targets, deliveries, reports) are owned by staff.
/// History rows are created by the launcher and afterwards mutated only by
/// the task that executes them, through the `update_*_history` methods.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait BackofficeStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Targets ───────────────────────────────────────────────────────────

  fn add_target(
    &self,
    input: NewTarget,
  ) -> impl Future<Output = Result<Target, Self::Error>> + Send + '_;

  fn get_target(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Target>, Self::Error>> + Send + '_;

  /// All targets, ordered by name.
  fn list_targets(
    &self,
  ) -> impl Future<Output = Result<Vec<Target>, Self::Error>> + Send + '_;

  /// Delete a target, clearing the target reference of its deliveries.
  /// Returns `false` if no such target existed.
  fn delete_target(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Deliveries ────────────────────────────────────────────────────────

  fn add_delivery(
    &self,
    input: NewDelivery,
  ) -> impl Future<Output = Result<Delivery, Self::Error>> + Send + '_;

  fn get_delivery(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Delivery>, Self::Error>> + Send + '_;

  /// Deliveries newest first, optionally restricted to one report.
  fn list_deliveries(
    &self,
    report_id: Option<Uuid>,
  ) -> impl Future<Output = Result<Vec<Delivery>, Self::Error>> + Send + '_;

  /// Deliveries for `report_id` with `is_active` set.
  fn active_deliveries(
    &self,
    report_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Delivery>, Self::Error>> + Send + '_;

  /// Toggle activation. Returns `None` if the delivery does not exist.
  fn set_delivery_active(
    &self,
    id: Uuid,
    is_active: bool,
  ) -> impl Future<Output = Result<Option<Delivery>, Self::Error>> + Send + '_;

  // ── Reports ───────────────────────────────────────────────────────────

  fn add_report(
    &self,
    input: NewReport,
  ) -> impl Future<Output = Result<Report, Self::Error>> + Send + '_;

  fn get_report(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Report>, Self::Error>> + Send + '_;

  /// Reports ordered by name. `search` matches name or description,
  /// case-insensitively.
  fn list_reports(
    &self,
    search: Option<String>,
  ) -> impl Future<Output = Result<Vec<Report>, Self::Error>> + Send + '_;

  /// Delete a report together with its report histories, clearing the
  /// report reference of its deliveries.
  fn delete_report(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Report histories ──────────────────────────────────────────────────

  /// Persist a new `pending` report history.
  fn add_report_history(
    &self,
    input: NewReportHistory,
  ) -> impl Future<Output = Result<ReportHistory, Self::Error>> + Send + '_;

  fn get_report_history(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<ReportHistory>, Self::Error>> + Send + '_;

  /// Report histories newest first, optionally restricted to one report.
  fn list_report_histories(
    &self,
    report_id: Option<Uuid>,
  ) -> impl Future<Output = Result<Vec<ReportHistory>, Self::Error>> + Send + '_;

  /// Apply `update` and return the row as stored afterwards.
  ///
  /// Returns an error if the row does not exist or the status change is not
  /// a forward transition.
  fn update_report_history(
    &self,
    id: Uuid,
    update: HistoryUpdate,
  ) -> impl Future<Output = Result<ReportHistory, Self::Error>> + Send + '_;

  // ── Delivery histories ────────────────────────────────────────────────

  /// Persist a new `pending` delivery history.
  fn add_delivery_history(
    &self,
    report_history_id: Uuid,
    delivery_id: Uuid,
  ) -> impl Future<Output = Result<DeliveryHistory, Self::Error>> + Send + '_;

  fn get_delivery_history(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<DeliveryHistory>, Self::Error>> + Send + '_;

  /// Delivery histories newest first, optionally restricted to one delivery.
  fn list_delivery_histories(
    &self,
    delivery_id: Option<Uuid>,
  ) -> impl Future<Output = Result<Vec<DeliveryHistory>, Self::Error>> + Send + '_;

  /// Apply `update` and return the row as stored afterwards. Same rules as
  /// [`BackofficeStore::update_report_history`].
  fn update_delivery_history(
    &self,
    id: Uuid,
    update: HistoryUpdate,
  ) -> impl Future<Output = Result<DeliveryHistory, Self::Error>> + Send + '_;
}
