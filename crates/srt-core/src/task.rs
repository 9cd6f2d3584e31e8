//! The contract between the backoffice and the job runner that executes its
//! asynchronous work.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Result, target::TargetKind};

/// Opaque identifier handed back by the job runner at enqueue time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
  pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for TaskId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl From<TaskId> for String {
  fn from(id: TaskId) -> Self { id.0 }
}

/// A unit of asynchronous work together with its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "task", rename_all = "snake_case")]
pub enum Task {
  /// Render the report for a pre-created report history row.
  GenerateReport { history_id: Uuid },
  /// Periodic launch: the job creates its own report history row.
  ScheduledReport { report_id: Uuid },
  /// Push a report artifact to one delivery target. The transport is fixed
  /// when the task is enqueued.
  Deliver { transport: TargetKind, history_id: Uuid },
}

impl Task {
  /// Stable task name as seen by the job runner.
  pub fn name(&self) -> String {
    match self {
      Self::GenerateReport { .. } => "reports.generate".to_owned(),
      Self::ScheduledReport { .. } => "reports.scheduled".to_owned(),
      Self::Deliver { transport, .. } => format!("deliveries.{transport}"),
    }
  }
}

/// Accepts tasks for eventual execution and returns immediately.
///
/// The runner guarantees the task will be handed to its handler at some
/// point; callers never wait on a result.
pub trait JobRunner: Send + Sync {
  fn enqueue(&self, task: Task) -> Result<TaskId>;
}
