//! Error type for `srt-objstore`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("object store error: {0}")]
  Provider(#[from] object_store::Error),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("invalid object url {url:?}: {reason}")]
  InvalidUrl { url: String, reason: String },

  #[error("no remote path given and none can be derived from the upload source")]
  MissingRemotePath,
}

impl Error {
  pub fn is_not_found(&self) -> bool {
    matches!(self, Self::Provider(object_store::Error::NotFound { .. }))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
