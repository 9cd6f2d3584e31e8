//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are fixed-width RFC 3339 strings (microsecond precision) so
//! that they sort lexicographically. UUIDs are hyphenated lowercase strings.
//! Enums are stored as their lowercase names.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Row;
use srt_core::{
  delivery::Delivery,
  history::{DeliveryHistory, ReportHistory},
  report::{Report, ReportUid, parse_params},
  status::Status,
  target::{Target, TargetKind},
};
use uuid::Uuid;

use crate::{Error, Result, crypto::Sealer};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

fn decode_opt_uuid(s: Option<String>) -> Result<Option<Uuid>> {
  s.as_deref().map(decode_uuid).transpose()
}

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Enums ───────────────────────────────────────────────────────────────────

fn decode_enum<T: FromStr>(kind: &'static str, s: &str) -> Result<T> {
  s.parse().map_err(|_| {
    srt_core::Error::UnknownVariant { kind, value: s.to_owned() }.into()
  })
}

pub fn decode_status(s: &str) -> Result<Status> { decode_enum("status", s) }

// ─── Row types ───────────────────────────────────────────────────────────────

pub const TARGET_COLUMNS: &str = "target_id, name, kind, host, username, \
   password, path, emails, include_attachment, notes, created_at, modified_at";

/// Raw column values of a `targets` row. `password` is still sealed.
pub struct RawTarget {
  pub target_id:          String,
  pub name:               String,
  pub kind:               String,
  pub host:               Option<String>,
  pub username:           Option<String>,
  pub password:           Option<String>,
  pub path:               Option<String>,
  pub emails:             Option<String>,
  pub include_attachment: bool,
  pub notes:              String,
  pub created_at:         String,
  pub modified_at:        String,
}

impl RawTarget {
  pub fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      target_id:          r.get(0)?,
      name:               r.get(1)?,
      kind:               r.get(2)?,
      host:               r.get(3)?,
      username:           r.get(4)?,
      password:           r.get(5)?,
      path:               r.get(6)?,
      emails:             r.get(7)?,
      include_attachment: r.get(8)?,
      notes:              r.get(9)?,
      created_at:         r.get(10)?,
      modified_at:        r.get(11)?,
    })
  }

  pub fn into_target(self, sealer: &Sealer) -> Result<Target> {
    Ok(Target {
      target_id:          decode_uuid(&self.target_id)?,
      name:               self.name,
      kind:               decode_enum::<TargetKind>("target kind", &self.kind)?,
      host:               self.host,
      username:           self.username,
      password:           self.password.as_deref().map(|p| sealer.open(p)).transpose()?,
      path:               self.path,
      emails:             self.emails,
      include_attachment: self.include_attachment,
      notes:              self.notes,
      created_at:         decode_dt(&self.created_at)?,
      modified_at:        decode_dt(&self.modified_at)?,
    })
  }
}

pub const DELIVERY_COLUMNS: &str =
  "delivery_id, target_id, report_id, path, is_active, notes, created_at, modified_at";

pub struct RawDelivery {
  pub delivery_id: String,
  pub target_id:   Option<String>,
  pub report_id:   Option<String>,
  pub path:        Option<String>,
  pub is_active:   bool,
  pub notes:       String,
  pub created_at:  String,
  pub modified_at: String,
}

impl RawDelivery {
  pub fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      delivery_id: r.get(0)?,
      target_id:   r.get(1)?,
      report_id:   r.get(2)?,
      path:        r.get(3)?,
      is_active:   r.get(4)?,
      notes:       r.get(5)?,
      created_at:  r.get(6)?,
      modified_at: r.get(7)?,
    })
  }

  pub fn into_delivery(self) -> Result<Delivery> {
    Ok(Delivery {
      delivery_id: decode_uuid(&self.delivery_id)?,
      target_id:   decode_opt_uuid(self.target_id)?,
      report_id:   decode_opt_uuid(self.report_id)?,
      path:        self.path,
      is_active:   self.is_active,
      notes:       self.notes,
      created_at:  decode_dt(&self.created_at)?,
      modified_at: decode_dt(&self.modified_at)?,
    })
  }
}

pub const REPORT_COLUMNS: &str =
  "report_id, uid, name, description, params, created_at, modified_at";

pub struct RawReport {
  pub report_id:   String,
  pub uid:         String,
  pub name:        String,
  pub description: Option<String>,
  pub params:      String,
  pub created_at:  String,
  pub modified_at: String,
}

impl RawReport {
  pub fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      report_id:   r.get(0)?,
      uid:         r.get(1)?,
      name:        r.get(2)?,
      description: r.get(3)?,
      params:      r.get(4)?,
      created_at:  r.get(5)?,
      modified_at: r.get(6)?,
    })
  }

  pub fn into_report(self) -> Result<Report> {
    Ok(Report {
      report_id:   decode_uuid(&self.report_id)?,
      uid:         decode_enum::<ReportUid>("report uid", &self.uid)?,
      name:        self.name,
      description: self.description,
      params:      parse_params(&self.params)?,
      created_at:  decode_dt(&self.created_at)?,
      modified_at: decode_dt(&self.modified_at)?,
    })
  }
}

pub const REPORT_HISTORY_COLUMNS: &str = "report_history_id, report_id, status, \
   path, params, msg, task_id, created_at, modified_at";

pub struct RawReportHistory {
  pub report_history_id: String,
  pub report_id:         String,
  pub status:            String,
  pub path:              Option<String>,
  pub params:            String,
  pub msg:               Option<String>,
  pub task_id:           Option<String>,
  pub created_at:        String,
  pub modified_at:       String,
}

impl RawReportHistory {
  pub fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      report_history_id: r.get(0)?,
      report_id:         r.get(1)?,
      status:            r.get(2)?,
      path:              r.get(3)?,
      params:            r.get(4)?,
      msg:               r.get(5)?,
      task_id:           r.get(6)?,
      created_at:        r.get(7)?,
      modified_at:       r.get(8)?,
    })
  }

  pub fn into_history(self) -> Result<ReportHistory> {
    Ok(ReportHistory {
      report_history_id: decode_uuid(&self.report_history_id)?,
      report_id:         decode_uuid(&self.report_id)?,
      status:            decode_status(&self.status)?,
      path:              self.path,
      params:            self.params,
      msg:               self.msg,
      task_id:           self.task_id,
      created_at:        decode_dt(&self.created_at)?,
      modified_at:       decode_dt(&self.modified_at)?,
    })
  }
}

pub const DELIVERY_HISTORY_COLUMNS: &str = "delivery_history_id, \
   report_history_id, delivery_id, status, url, msg, task_id, created_at, modified_at";

pub struct RawDeliveryHistory {
  pub delivery_history_id: String,
  pub report_history_id:   Option<String>,
  pub delivery_id:         Option<String>,
  pub status:              String,
  pub url:                 Option<String>,
  pub msg:                 Option<String>,
  pub task_id:             Option<String>,
  pub created_at:          String,
  pub modified_at:         String,
}

impl RawDeliveryHistory {
  pub fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      delivery_history_id: r.get(0)?,
      report_history_id:   r.get(1)?,
      delivery_id:         r.get(2)?,
      status:              r.get(3)?,
      url:                 r.get(4)?,
      msg:                 r.get(5)?,
      task_id:             r.get(6)?,
      created_at:          r.get(7)?,
      modified_at:         r.get(8)?,
    })
  }

  pub fn into_history(self) -> Result<DeliveryHistory> {
    Ok(DeliveryHistory {
      delivery_history_id: decode_uuid(&self.delivery_history_id)?,
      report_history_id:   decode_opt_uuid(self.report_history_id)?,
      delivery_id:         decode_opt_uuid(self.delivery_id)?,
      status:              decode_status(&self.status)?,
      url:                 self.url,
      msg:                 self.msg,
      task_id:             self.task_id,
      created_at:          decode_dt(&self.created_at)?,
      modified_at:         decode_dt(&self.modified_at)?,
    })
  }
}
