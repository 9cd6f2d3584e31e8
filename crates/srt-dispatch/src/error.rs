//! Error type for `srt-dispatch`.

use thiserror::Error;
use uuid::Uuid;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  #[error("store error: {0}")]
  Store(BoxError),

  #[error(transparent)]
  Core(#[from] srt_core::Error),

  #[error(transparent)]
  ObjectStore(#[from] srt_objstore::Error),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("report not found: {0}")]
  ReportNotFound(Uuid),

  #[error("report history not found: {0}")]
  ReportHistoryNotFound(Uuid),

  #[error("delivery not found: {0}")]
  DeliveryNotFound(Uuid),

  #[error("delivery history not found: {0}")]
  DeliveryHistoryNotFound(Uuid),

  #[error("target not found: {0}")]
  TargetNotFound(Uuid),

  #[error("delivery {0} has no target")]
  DeliveryWithoutTarget(Uuid),

  #[error("delivery history {0} is not linked to a delivery")]
  HistoryWithoutDelivery(Uuid),

  #[error("delivery history {0} is not linked to a report history")]
  HistoryWithoutReportHistory(Uuid),

  #[error("report history {0} has no artifact")]
  ArtifactMissing(Uuid),

  #[error("destination {0:?} must be of the form bucket/path")]
  InvalidDestination(String),
}

impl Error {
  pub fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
