//! Deliveries bind a report to a target.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::target::Target;

/// Binds one report to one target. Only active deliveries are actioned.
///
/// Both references are nullable: deleting the report or the target keeps the
/// delivery (and its history) around with the reference cleared.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Delivery {
  pub delivery_id: Uuid,
  pub target_id:   Option<Uuid>,
  pub report_id:   Option<Uuid>,
  /// Appended to the target's base path.
  pub path:        Option<String>,
  pub is_active:   bool,
  pub notes:       String,
  pub created_at:  DateTime<Utc>,
  pub modified_at: DateTime<Utc>,
}

impl Delivery {
  /// The target's base path joined with this delivery's path.
  pub fn fullpath(&self, target: &Target) -> String {
    join_path([
      target.path.as_deref().unwrap_or("/"),
      self.path.as_deref().unwrap_or_default(),
    ])
  }
}

/// Input to [`crate::store::BackofficeStore::add_delivery`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewDelivery {
  pub target_id: Option<Uuid>,
  pub report_id: Option<Uuid>,
  #[serde(default)]
  pub path:      Option<String>,
  #[serde(default = "active_by_default")]
  pub is_active: bool,
  #[serde(default)]
  pub notes:     String,
}

fn active_by_default() -> bool { true }

impl NewDelivery {
  pub fn new(report_id: Uuid, target_id: Uuid) -> Self {
    Self {
      target_id: Some(target_id),
      report_id: Some(report_id),
      path:      None,
      is_active: true,
      notes:     String::new(),
    }
  }

  pub fn with_path(mut self, path: impl Into<String>) -> Self {
    self.path = Some(path.into());
    self
  }

  pub fn inactive(mut self) -> Self {
    self.is_active = false;
    self
  }
}

/// Join path fragments with `/`, dropping empty segments so the result never
/// holds a leading, trailing or doubled separator.
pub fn join_path<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
  parts
    .into_iter()
    .flat_map(|part| part.split('/'))
    .filter(|segment| !segment.is_empty())
    .collect::<Vec<_>>()
    .join("/")
}

/// The final segment of a `/`-separated path, or `""` when there is none.
pub fn basename(path: &str) -> &str {
  path.trim_end_matches('/').rsplit('/').next().unwrap_or_default()
}

/// Everything before the final segment of a `/`-separated path.
pub fn dirname(path: &str) -> &str {
  match path.trim_end_matches('/').rsplit_once('/') {
    Some((dir, _)) => dir,
    None => "",
  }
}
