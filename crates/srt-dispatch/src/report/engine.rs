//! Report engines render a report's CSV artifact.

use srt_core::report::{Params, Report, ReportUid};

use crate::Result;

/// Renders the artifact for one run of a report.
pub trait ReportEngine: Send + Sync {
  fn render(&self, report: &Report, params: &Params) -> Result<Vec<u8>>;
}

/// The engine selected by `uid`.
pub fn engine_for(uid: ReportUid) -> &'static dyn ReportEngine {
  match uid {
    ReportUid::Report1 => &Report1,
    ReportUid::Report2 => &Report2,
  }
}

/// Placeholder contact export.
pub struct Report1;

impl ReportEngine for Report1 {
  fn render(&self, _report: &Report, _params: &Params) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    write_row(&mut out, &["Full Name", "system@gmail.com", "10"]);
    Ok(out)
  }
}

/// Placeholder; renders the same row as [`Report1`].
pub struct Report2;

impl ReportEngine for Report2 {
  fn render(&self, _report: &Report, _params: &Params) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    write_row(&mut out, &["Full Name", "system@gmail.com", "10"]);
    Ok(out)
  }
}

/// Append one CSV record terminated by `\r\n`, quoting only fields that
/// need it.
fn write_row(out: &mut Vec<u8>, fields: &[&str]) {
  for (i, field) in fields.iter().enumerate() {
    if i > 0 {
      out.push(b',');
    }
    if field.contains([',', '"', '\r', '\n']) {
      out.push(b'"');
      out.extend_from_slice(field.replace('"', "\"\"").as_bytes());
      out.push(b'"');
    } else {
      out.extend_from_slice(field.as_bytes());
    }
  }
  out.extend_from_slice(b"\r\n");
}
