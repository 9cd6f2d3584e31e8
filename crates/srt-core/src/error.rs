//! Error types for `srt-core`.

use thiserror::Error;

use crate::status::Status;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid status transition: {from} -> {to}")]
  InvalidTransition { from: Status, to: Status },

  #[error("unknown {kind} discriminant: {value:?}")]
  UnknownVariant { kind: &'static str, value: String },

  #[error("report params must be a JSON object")]
  ParamsNotObject,

  #[error("job queue is closed")]
  QueueClosed,

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
