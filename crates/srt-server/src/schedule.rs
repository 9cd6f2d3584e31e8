//! Periodic report launches.
//!
//! Each configured schedule enqueues a scheduled-report task every
//! `every_secs` seconds. The first tick fires one full interval after start.

use std::{sync::Arc, time::Duration};

use serde::Deserialize;
use srt_core::task::{JobRunner, Task};
use tokio::{
  task::JoinHandle,
  time::{Instant, MissedTickBehavior},
};
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
  pub report_id:  Uuid,
  pub every_secs: u64,
}

/// Spawn one ticker per schedule.
pub fn spawn_all<R: JobRunner + 'static>(
  runner: Arc<R>,
  schedules: &[ScheduleConfig],
) -> Vec<JoinHandle<()>> {
  schedules
    .iter()
    .cloned()
    .map(|schedule| tokio::spawn(run(Arc::clone(&runner), schedule)))
    .collect()
}

/// Enqueue the schedule's report on every tick until the queue closes.
pub async fn run<R: JobRunner>(runner: Arc<R>, schedule: ScheduleConfig) {
  let ScheduleConfig { report_id, every_secs } = schedule;
  if every_secs == 0 {
    tracing::warn!(%report_id, "ignoring schedule with a zero interval");
    return;
  }

  let period = Duration::from_secs(every_secs);
  let mut interval = tokio::time::interval_at(Instant::now() + period, period);
  interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
  tracing::info!(%report_id, every_secs, "report schedule started");

  loop {
    interval.tick().await;
    match runner.enqueue(Task::ScheduledReport { report_id }) {
      Ok(task_id) => tracing::debug!(%report_id, %task_id, "enqueued scheduled report"),
      Err(e) => {
        tracing::warn!(%report_id, error = %e, "job queue closed; schedule stopping");
        return;
      }
    }
  }
}
