//! Object storage settings shared by report jobs and transports.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use srt_objstore::{Connector, Credentials, DEFAULT_URL_HOST, ObjectStoreClient};
use tempfile::TempDir;

use crate::Result;

/// Where report artifacts live and how to reach object storage.
///
/// The system credentials are used for the reports bucket and for reading
/// artifacts back; delivery targets bring their own keys.
#[derive(Clone)]
pub struct Storage {
  connector:      Arc<dyn Connector>,
  credentials:    Credentials,
  reports_bucket: String,
  reports_dir:    String,
  url_host:       String,
  scratch_root:   PathBuf,
}

impl Storage {
  pub fn new(
    connector: Arc<dyn Connector>,
    credentials: Credentials,
    reports_bucket: impl Into<String>,
    reports_dir: impl Into<String>,
  ) -> Self {
    Self {
      connector,
      credentials,
      reports_bucket: reports_bucket.into(),
      reports_dir: reports_dir.into(),
      url_host: DEFAULT_URL_HOST.to_owned(),
      scratch_root: std::env::temp_dir(),
    }
  }

  pub fn with_url_host(mut self, host: impl Into<String>) -> Self {
    self.url_host = host.into();
    self
  }

  /// Directory under which per-task scratch directories are created.
  pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
    self.scratch_root = root.into();
    self
  }

  pub fn url_host(&self) -> &str { &self.url_host }

  pub fn scratch_root(&self) -> &Path { &self.scratch_root }

  /// Credentials for a delivery target: its own key pair, with the region
  /// and endpoint of the system account.
  pub fn target_credentials(
    &self,
    access_key: Option<String>,
    secret_key: Option<String>,
  ) -> Credentials {
    Credentials {
      access_key,
      secret_key,
      ..self.credentials.clone()
    }
  }

  pub fn client(
    &self,
    credentials: &Credentials,
    bucket: &str,
    base_dir: Option<&str>,
  ) -> Result<ObjectStoreClient> {
    Ok(
      ObjectStoreClient::connect(self.connector.as_ref(), credentials, bucket, base_dir)?
        .with_host(&self.url_host),
    )
  }

  /// A client on `bucket` using the system credentials.
  pub fn system_client(&self, bucket: &str, base_dir: Option<&str>) -> Result<ObjectStoreClient> {
    self.client(&self.credentials, bucket, base_dir)
  }

  /// The bucket and environment directory report artifacts are written to.
  pub fn reports_client(&self) -> Result<ObjectStoreClient> {
    self.system_client(&self.reports_bucket, Some(&self.reports_dir))
  }

  /// A fresh scratch directory, removed when the guard is dropped.
  pub fn scratch_dir(&self) -> Result<TempDir> {
    std::fs::create_dir_all(&self.scratch_root)?;
    Ok(
      tempfile::Builder::new()
        .prefix("srt-")
        .tempdir_in(&self.scratch_root)?,
    )
  }
}
