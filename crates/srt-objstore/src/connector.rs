//! Connectors turn credentials and a bucket name into an [`ObjectStore`].

use std::{
  collections::HashMap,
  sync::{Arc, Mutex},
};

use http::{HeaderMap, HeaderValue};
use object_store::{
  ClientOptions, ObjectStore, aws::AmazonS3Builder, memory::InMemory,
};

use crate::Result;

const DEFAULT_REGION: &str = "us-east-1";

/// Access credentials for one provider account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
  pub access_key: Option<String>,
  pub secret_key: Option<String>,
  pub region:     String,
  /// Custom endpoint for S3-compatible services (e.g. MinIO).
  pub endpoint:   Option<String>,
}

impl Credentials {
  pub fn new(access_key: Option<String>, secret_key: Option<String>) -> Self {
    Self { access_key, secret_key, ..Self::default() }
  }

  pub fn with_region(mut self, region: impl Into<String>) -> Self {
    self.region = region.into();
    self
  }

  pub fn with_endpoint(mut self, endpoint: Option<String>) -> Self {
    self.endpoint = endpoint;
    self
  }
}

impl Default for Credentials {
  fn default() -> Self {
    Self {
      access_key: None,
      secret_key: None,
      region:     DEFAULT_REGION.to_owned(),
      endpoint:   None,
    }
  }
}

/// Canned ACL applied to uploaded objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Acl {
  #[default]
  Private,
  PublicRead,
}

impl Acl {
  pub fn as_header(self) -> &'static str {
    match self {
      Self::Private => "private",
      Self::PublicRead => "public-read",
    }
  }
}

/// Opens bucket-scoped stores.
///
/// A connector is asked for one store per ACL; writes through the
/// [`Acl::PublicRead`] store produce publicly readable objects.
pub trait Connector: Send + Sync {
  fn connect(
    &self,
    credentials: &Credentials,
    bucket: &str,
    acl: Acl,
  ) -> Result<Arc<dyn ObjectStore>>;
}

/// Connects to AWS S3 or any S3-compatible endpoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct S3Connector;

impl Connector for S3Connector {
  fn connect(
    &self,
    credentials: &Credentials,
    bucket: &str,
    acl: Acl,
  ) -> Result<Arc<dyn ObjectStore>> {
    let mut headers = HeaderMap::new();
    headers.insert("x-amz-acl", HeaderValue::from_static(acl.as_header()));

    let mut builder = AmazonS3Builder::new()
      .with_bucket_name(bucket)
      .with_region(&credentials.region)
      .with_client_options(ClientOptions::new().with_default_headers(headers));

    if let Some(endpoint) = &credentials.endpoint {
      builder = builder.with_endpoint(endpoint);
      if endpoint.starts_with("http://") {
        builder = builder.with_allow_http(true);
      }
    }
    if let Some(key) = &credentials.access_key {
      builder = builder.with_access_key_id(key);
    }
    if let Some(secret) = &credentials.secret_key {
      builder = builder.with_secret_access_key(secret);
    }

    tracing::debug!(bucket, acl = acl.as_header(), "connecting to s3");
    Ok(Arc::new(builder.build()?))
  }
}

/// Process-local buckets held in memory, created on first use.
///
/// Credentials and ACLs are accepted and ignored. Used for local runs and
/// tests, which can reach into a bucket with [`MemoryConnector::bucket`].
#[derive(Debug, Default)]
pub struct MemoryConnector {
  buckets: Mutex<HashMap<String, Arc<InMemory>>>,
}

impl MemoryConnector {
  pub fn new() -> Self { Self::default() }

  /// The store backing `name`, creating an empty one if needed.
  pub fn bucket(&self, name: &str) -> Arc<InMemory> {
    let mut buckets = self
      .buckets
      .lock()
      .unwrap_or_else(|poisoned| poisoned.into_inner());
    buckets
      .entry(name.to_owned())
      .or_insert_with(|| Arc::new(InMemory::new()))
      .clone()
  }
}

impl Connector for MemoryConnector {
  fn connect(
    &self,
    _credentials: &Credentials,
    bucket: &str,
    _acl: Acl,
  ) -> Result<Arc<dyn ObjectStore>> {
    Ok(self.bucket(bucket))
  }
}
