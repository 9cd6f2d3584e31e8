//! [`Worker`]: routes queued tasks to report jobs and transports.

use srt_core::{
  store::BackofficeStore,
  task::{JobRunner, Task, TaskId},
};
use tracing::Instrument as _;

use crate::{
  Launcher, Storage,
  queue::{Envelope, TaskHandler},
  report::ReportJob,
  transport::{self, Transport},
};

pub struct Worker<S, R> {
  launcher: Launcher<S, R>,
  storage:  Storage,
}

impl<S: BackofficeStore, R: JobRunner> Worker<S, R> {
  pub fn new(launcher: Launcher<S, R>, storage: Storage) -> Self { Self { launcher, storage } }

  async fn dispatch(&self, id: TaskId, task: Task) {
    match task {
      Task::GenerateReport { history_id } => {
        ReportJob::new(&self.launcher, &self.storage).run(history_id).await;
      }
      Task::ScheduledReport { report_id } => {
        ReportJob::new(&self.launcher, &self.storage)
          .run_scheduled(report_id, &id)
          .await;
      }
      Task::Deliver { transport, history_id } => {
        let transport = Transport::for_kind(transport);
        transport::run(transport, self.launcher.store(), &self.storage, history_id).await;
      }
    }
  }
}

impl<S, R> TaskHandler for Worker<S, R>
where
  S: BackofficeStore + 'static,
  R: JobRunner + 'static,
{
  async fn handle(&self, envelope: Envelope) {
    let Envelope { id, task } = envelope;
    let span = tracing::info_span!("task", task_id = %id, task = %task.name());
    self.dispatch(id, task).instrument(span).await;
  }
}
