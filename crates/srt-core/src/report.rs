//! Report definitions and launch parameters.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

/// Selects which job implementation renders a report.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ReportUid {
  #[default]
  Report1,
  Report2,
}

/// JSON parameters handed to a report job.
pub type Params = Map<String, Value>;

/// A named, parametrised job definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
  pub report_id:   Uuid,
  pub uid:         ReportUid,
  pub name:        String,
  pub description: Option<String>,
  pub params:      Params,
  pub created_at:  DateTime<Utc>,
  pub modified_at: DateTime<Utc>,
}

impl Report {
  /// The params a launch runs with: the optional date range underneath the
  /// stored params, so a stored `start_date`/`end_date` wins.
  pub fn launch_params(&self, range: Option<DateRange>) -> Params {
    let mut params = range.map(DateRange::into_params).unwrap_or_default();
    params.extend(self.params.clone());
    params
  }
}

/// Input to [`crate::store::BackofficeStore::add_report`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewReport {
  #[serde(default)]
  pub uid:         ReportUid,
  pub name:        String,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub params:      Params,
}

impl NewReport {
  pub fn new(uid: ReportUid, name: impl Into<String>) -> Self {
    Self { uid, name: name.into(), description: None, params: Params::new() }
  }
}

/// An inclusive reporting window supplied at launch time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
  pub start: NaiveDate,
  pub end:   NaiveDate,
}

impl DateRange {
  /// A range exists only when both bounds are given.
  pub fn from_bounds(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Option<Self> {
    Some(Self { start: start?, end: end? })
  }

  fn into_params(self) -> Params {
    let mut params = Params::new();
    params.insert("start_date".into(), Value::String(self.start.format("%Y-%m-%d").to_string()));
    params.insert("end_date".into(), Value::String(self.end.format("%Y-%m-%d").to_string()));
    params
  }
}

/// Pretty-printed, key-sorted JSON snapshot stored on a report history row.
pub fn params_snapshot(params: &Params) -> Result<String> {
  let sorted: BTreeMap<&String, &Value> = params.iter().collect();
  Ok(serde_json::to_string_pretty(&sorted)?)
}

/// Parse a stored params blob; empty input is an empty object.
pub fn parse_params(raw: &str) -> Result<Params> {
  if raw.trim().is_empty() {
    return Ok(Params::new());
  }
  match serde_json::from_str(raw)? {
    Value::Object(map) => Ok(map),
    Value::Null => Ok(Params::new()),
    _ => Err(Error::ParamsNotObject),
  }
}
