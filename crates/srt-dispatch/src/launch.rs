//! [`Launcher`]: creates history rows and enqueues the tasks that run them.

use std::sync::Arc;

use srt_core::{
  delivery::Delivery,
  history::{DeliveryHistory, HistoryUpdate, NewReportHistory, ReportHistory},
  report::{DateRange, Params, Report, params_snapshot},
  store::BackofficeStore,
  target::Target,
  task::{JobRunner, Task},
};
use uuid::Uuid;

use crate::{Error, Result};

/// Entry point for starting report runs and delivery attempts.
///
/// Every launch persists a `pending` history row first, then enqueues the
/// task with the row id and finally records the task id on the row.
pub struct Launcher<S, R> {
  store:  Arc<S>,
  runner: Arc<R>,
}

impl<S, R> Clone for Launcher<S, R> {
  fn clone(&self) -> Self {
    Self {
      store:  Arc::clone(&self.store),
      runner: Arc::clone(&self.runner),
    }
  }
}

impl<S: BackofficeStore, R: JobRunner> Launcher<S, R> {
  pub fn new(store: Arc<S>, runner: Arc<R>) -> Self { Self { store, runner } }

  pub fn store(&self) -> &S { &self.store }

  pub fn runner(&self) -> &R { &self.runner }

  // ─── Reports ─────────────────────────────────────────────────────────────

  /// Launch `report_id`, merging the optional date range under its stored
  /// params.
  pub async fn launch_report(
    &self,
    report_id: Uuid,
    range: Option<DateRange>,
  ) -> Result<ReportHistory> {
    let report = self
      .store
      .get_report(report_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::ReportNotFound(report_id))?;
    let params = report.launch_params(range);
    self.launch_report_history(&report, &params).await
  }

  pub async fn launch_report_history(
    &self,
    report: &Report,
    params: &Params,
  ) -> Result<ReportHistory> {
    let history = self
      .store
      .add_report_history(NewReportHistory {
        report_id: report.report_id,
        params:    params_snapshot(params)?,
        task_id:   None,
      })
      .await
      .map_err(Error::store)?;

    let task_id = self
      .runner
      .enqueue(Task::GenerateReport { history_id: history.report_history_id })?;
    let history = self
      .store
      .update_report_history(history.report_history_id, HistoryUpdate::task_id(task_id))
      .await
      .map_err(Error::store)?;

    tracing::info!(
      report_id = %report.report_id,
      report_history_id = %history.report_history_id,
      "launched report"
    );
    Ok(history)
  }

  // ─── Deliveries ──────────────────────────────────────────────────────────

  /// Launch every active delivery of the report behind `report_history`.
  ///
  /// Every active delivery gets exactly one new history row; one that
  /// cannot be dispatched ends up `failed` on its own row. Only store or
  /// queue errors skip a delivery, and the others still go out. Returns the
  /// histories that were created.
  pub async fn deliver(&self, report_history: &ReportHistory) -> Result<Vec<DeliveryHistory>> {
    let deliveries = self
      .store
      .active_deliveries(report_history.report_id)
      .await
      .map_err(Error::store)?;

    let mut launched = Vec::with_capacity(deliveries.len());
    for delivery in &deliveries {
      match self.launch_delivery(report_history, delivery).await {
        Ok(history) => launched.push(history),
        Err(e) => tracing::warn!(
          delivery_id = %delivery.delivery_id,
          report_history_id = %report_history.report_history_id,
          error = %e,
          "failed to launch delivery"
        ),
      }
    }
    Ok(launched)
  }

  /// Create a `pending` attempt for `delivery` and enqueue its transport.
  ///
  /// The row is persisted before the target is resolved, so a delivery whose
  /// target is gone still gets an attempt, recorded as `failed`.
  pub async fn launch_delivery(
    &self,
    report_history: &ReportHistory,
    delivery: &Delivery,
  ) -> Result<DeliveryHistory> {
    let history = self
      .store
      .add_delivery_history(report_history.report_history_id, delivery.delivery_id)
      .await
      .map_err(Error::store)?;
    let history_id = history.delivery_history_id;

    let target = match self.resolve_target(delivery).await {
      Ok(target) => target,
      Err(e) => {
        tracing::warn!(
          delivery_id = %delivery.delivery_id,
          delivery_history_id = %history_id,
          error = %e,
          "delivery cannot be dispatched"
        );
        return self
          .store
          .update_delivery_history(history_id, HistoryUpdate::failed(e.to_string()))
          .await
          .map_err(Error::store);
      }
    };

    let task_id = self.runner.enqueue(Task::Deliver {
      transport: target.kind,
      history_id,
    })?;
    let history = self
      .store
      .update_delivery_history(history_id, HistoryUpdate::task_id(task_id))
      .await
      .map_err(Error::store)?;

    tracing::info!(
      delivery_id = %delivery.delivery_id,
      delivery_history_id = %history_id,
      kind = %target.kind,
      "launched delivery"
    );
    Ok(history)
  }

  async fn resolve_target(&self, delivery: &Delivery) -> Result<Target> {
    let target_id = delivery
      .target_id
      .ok_or(Error::DeliveryWithoutTarget(delivery.delivery_id))?;
    self
      .store
      .get_target(target_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::TargetNotFound(target_id))
  }

  /// Launch the delivery of an earlier attempt again. The earlier row is
  /// left as it is; a new one is created.
  pub async fn relaunch_delivery(&self, delivery_history_id: Uuid) -> Result<DeliveryHistory> {
    let previous = self
      .store
      .get_delivery_history(delivery_history_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::DeliveryHistoryNotFound(delivery_history_id))?;

    let report_history_id = previous
      .report_history_id
      .ok_or(Error::HistoryWithoutReportHistory(delivery_history_id))?;
    let report_history = self
      .store
      .get_report_history(report_history_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::ReportHistoryNotFound(report_history_id))?;

    let delivery_id = previous
      .delivery_id
      .ok_or(Error::HistoryWithoutDelivery(delivery_history_id))?;
    let delivery = self
      .store
      .get_delivery(delivery_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::DeliveryNotFound(delivery_id))?;

    self.launch_delivery(&report_history, &delivery).await
  }
}
