//! Report jobs: render a report, upload the artifact, fan out deliveries.

mod engine;

use srt_core::{
  history::{HistoryUpdate, NewReportHistory, ReportHistory},
  report::{params_snapshot, parse_params},
  status::Status,
  store::BackofficeStore,
  task::{JobRunner, TaskId},
};
use srt_objstore::{UploadOptions, UploadSource};
use uuid::Uuid;

pub use self::engine::{Report1, Report2, ReportEngine, engine_for};
use crate::{Error, Launcher, Result, Storage};

/// One report task, borrowing the worker's launcher and storage.
pub struct ReportJob<'a, S, R> {
  launcher: &'a Launcher<S, R>,
  storage:  &'a Storage,
}

impl<'a, S: BackofficeStore, R: JobRunner> ReportJob<'a, S, R> {
  pub fn new(launcher: &'a Launcher<S, R>, storage: &'a Storage) -> Self {
    Self { launcher, storage }
  }

  /// Run a launched report, whose history row already exists.
  #[tracing::instrument(skip(self))]
  pub async fn run(&self, history_id: Uuid) {
    match self.launcher.store().get_report_history(history_id).await {
      Ok(Some(history)) => self.execute(history).await,
      Ok(None) => tracing::error!("report history not found; nothing to record"),
      Err(e) => tracing::error!(error = %e, "failed to load report history"),
    }
  }

  /// Periodic entry point: create the history row for `report_id` under the
  /// current task's id, then run it.
  #[tracing::instrument(skip(self, task_id), fields(task_id = %task_id))]
  pub async fn run_scheduled(&self, report_id: Uuid, task_id: &TaskId) {
    match self.beat(report_id, task_id).await {
      Ok(history) => self.execute(history).await,
      Err(e) => tracing::error!(error = %e, "scheduled report could not start"),
    }
  }

  async fn beat(&self, report_id: Uuid, task_id: &TaskId) -> Result<ReportHistory> {
    let store = self.launcher.store();
    let report = store
      .get_report(report_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::ReportNotFound(report_id))?;
    store
      .add_report_history(NewReportHistory {
        report_id,
        params: params_snapshot(&report.params)?,
        task_id: Some(task_id.to_string()),
      })
      .await
      .map_err(Error::store)
  }

  /// Generate the artifact for `history` and record the outcome. On success
  /// the report's active deliveries are launched.
  pub async fn execute(&self, history: ReportHistory) {
    let store = self.launcher.store();
    let id = history.report_history_id;

    let update = match self.generate(&history).await {
      Ok(url) => HistoryUpdate::status(Status::Completed).with_artifact_url(url),
      Err(e) => {
        tracing::warn!(report_history_id = %id, error = %e, "report failed");
        HistoryUpdate::failed(e.to_string())
      }
    };

    let history = match store.update_report_history(id, update).await {
      Ok(history) => history,
      Err(e) => {
        tracing::error!(report_history_id = %id, error = %e, "failed to record report outcome");
        return;
      }
    };
    if history.status != Status::Completed {
      return;
    }

    tracing::info!(report_history_id = %id, path = ?history.path, "report completed");
    match self.launcher.deliver(&history).await {
      Ok(launched) => tracing::info!(report_history_id = %id, deliveries = launched.len(), "deliveries launched"),
      Err(e) => tracing::error!(report_history_id = %id, error = %e, "failed to launch deliveries"),
    }
  }

  /// Render and upload; returns the artifact's public URL.
  async fn generate(&self, history: &ReportHistory) -> Result<String> {
    let store = self.launcher.store();
    store
      .update_report_history(history.report_history_id, HistoryUpdate::status(Status::Processing))
      .await
      .map_err(Error::store)?;

    let report = store
      .get_report(history.report_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::ReportNotFound(history.report_id))?;
    let params = parse_params(&history.params)?;

    let scratch = self.storage.scratch_dir()?;
    let filename = format!("{}.csv", Uuid::new_v4());
    let local = scratch.path().join(&filename);
    let content = engine_for(report.uid).render(&report, &params)?;
    tokio::fs::write(&local, content).await?;

    let remote = format!("report_{}/{filename}", report.report_id);
    let client = self.storage.reports_client()?;
    client
      .upload(UploadSource::File(&local), Some(&remote), UploadOptions::public())
      .await?;
    Ok(client.get_url(&remote))
  }
}
