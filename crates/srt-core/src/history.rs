//! History rows: one per tracked report run or delivery attempt.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::status::Status;

/// One execution of a report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportHistory {
  pub report_history_id: Uuid,
  pub report_id:         Uuid,
  pub status:            Status,
  /// Public URL of the produced artifact, once known.
  pub path:              Option<String>,
  /// JSON snapshot of the params the run was launched with.
  pub params:            String,
  pub msg:               Option<String>,
  pub task_id:           Option<String>,
  pub created_at:        DateTime<Utc>,
  pub modified_at:       DateTime<Utc>,
}

/// Input to [`crate::store::BackofficeStore::add_report_history`]. Rows always
/// start out `pending`.
#[derive(Debug, Clone)]
pub struct NewReportHistory {
  pub report_id: Uuid,
  pub params:    String,
  pub task_id:   Option<String>,
}

/// One attempt at forwarding a report artifact to a delivery target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryHistory {
  pub delivery_history_id: Uuid,
  /// The report run that triggered this attempt.
  pub report_history_id:   Option<Uuid>,
  pub delivery_id:         Option<Uuid>,
  pub status:              Status,
  /// URL of the delivered artifact, once known.
  pub url:                 Option<String>,
  pub msg:                 Option<String>,
  pub task_id:             Option<String>,
  pub created_at:          DateTime<Utc>,
  pub modified_at:         DateTime<Utc>,
}

/// A partial update to a history row. `None` fields are left untouched.
///
/// A status change is validated against [`Status::can_transition_to`] by the
/// store; the other fields can be written at any point in the lifecycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryUpdate {
  pub status:       Option<Status>,
  pub msg:          Option<String>,
  /// `path` on report histories, `url` on delivery histories.
  pub artifact_url: Option<String>,
  pub task_id:      Option<String>,
}

impl HistoryUpdate {
  pub fn status(status: Status) -> Self {
    Self { status: Some(status), ..Self::default() }
  }

  pub fn msg(msg: impl Into<String>) -> Self {
    Self { msg: Some(msg.into()), ..Self::default() }
  }

  pub fn task_id(task_id: impl Into<String>) -> Self {
    Self { task_id: Some(task_id.into()), ..Self::default() }
  }

  pub fn completed(msg: impl Into<String>) -> Self {
    Self::status(Status::Completed).with_msg(msg)
  }

  pub fn failed(msg: impl Into<String>) -> Self {
    Self::status(Status::Failed).with_msg(msg)
  }

  pub fn with_msg(mut self, msg: impl Into<String>) -> Self {
    self.msg = Some(msg.into());
    self
  }

  pub fn with_artifact_url(mut self, url: impl Into<String>) -> Self {
    self.artifact_url = Some(url.into());
    self
  }
}
