//! Delivery targets, the places a finished report can be forwarded to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

/// The transport family a target belongs to.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TargetKind {
  /// An object-store bucket; `path` starts with the bucket name.
  #[default]
  S3,
  Ftp,
  Sftp,
  Email,
}

/// A named, staff-configured delivery destination.
///
/// Which fields are meaningful depends on [`TargetKind`]:
///
/// | kind | fields |
/// |------|--------|
/// | `s3` | `username` (access key), `password` (secret), `path` |
/// | `ftp`, `sftp` | `host`, `username`, `password`, `path` |
/// | `email` | `emails`, `include_attachment` |
///
/// Nothing enforces that split; a misconfigured target only surfaces when a
/// delivery to it fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
  pub target_id:          Uuid,
  pub name:               String,
  pub kind:               TargetKind,
  pub host:               Option<String>,
  pub username:           Option<String>,
  /// Never serialised; the store keeps it encrypted at rest.
  #[serde(skip_serializing, default)]
  pub password:           Option<String>,
  pub path:               Option<String>,
  /// Comma-delimited list of addresses.
  pub emails:             Option<String>,
  pub include_attachment: bool,
  pub notes:              String,
  pub created_at:         DateTime<Utc>,
  pub modified_at:        DateTime<Utc>,
}

impl Target {
  /// Human-readable description of where this target points.
  pub fn location(&self) -> &str {
    let field = match self.kind {
      TargetKind::S3 => &self.path,
      TargetKind::Ftp | TargetKind::Sftp => &self.host,
      TargetKind::Email => &self.emails,
    };
    field.as_deref().unwrap_or_default()
  }

  pub fn email_list(&self) -> Vec<String> {
    self
      .emails
      .as_deref()
      .unwrap_or_default()
      .split(',')
      .map(str::trim)
      .filter(|s| !s.is_empty())
      .map(str::to_owned)
      .collect()
  }
}

/// Input to [`crate::store::BackofficeStore::add_target`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTarget {
  pub name:               String,
  #[serde(default)]
  pub kind:               TargetKind,
  #[serde(default)]
  pub host:               Option<String>,
  #[serde(default)]
  pub username:           Option<String>,
  #[serde(default)]
  pub password:           Option<String>,
  #[serde(default)]
  pub path:               Option<String>,
  #[serde(default)]
  pub emails:             Option<String>,
  #[serde(default)]
  pub include_attachment: bool,
  #[serde(default)]
  pub notes:              String,
}

impl NewTarget {
  pub fn new(name: impl Into<String>, kind: TargetKind) -> Self {
    Self { name: name.into(), kind, ..Self::default() }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn target(kind: TargetKind) -> Target {
    Target {
      target_id:          Uuid::new_v4(),
      name:               "t".into(),
      kind,
      host:               Some("ftp.example.com".into()),
      username:           None,
      password:           Some("hunter2".into()),
      path:               Some("bucket1/reports".into()),
      emails:             Some(" a@example.com, ,b@example.com ".into()),
      include_attachment: false,
      notes:              String::new(),
      created_at:         Utc::now(),
      modified_at:        Utc::now(),
    }
  }

  #[test]
  fn location_follows_kind() {
    assert_eq!(target(TargetKind::S3).location(), "bucket1/reports");
    assert_eq!(target(TargetKind::Sftp).location(), "ftp.example.com");
    assert_eq!(
      target(TargetKind::Email).location(),
      " a@example.com, ,b@example.com "
    );
  }

  #[test]
  fn email_list_drops_blanks() {
    assert_eq!(
      target(TargetKind::Email).email_list(),
      vec!["a@example.com".to_string(), "b@example.com".to_string()]
    );
  }

  #[test]
  fn password_is_not_serialised() {
    let json = serde_json::to_value(target(TargetKind::S3)).unwrap();
    assert!(json.get("password").is_none());
    assert_eq!(json["kind"], "s3");
  }
}
