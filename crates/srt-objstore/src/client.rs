//! [`ObjectStoreClient`]: bucket and base-directory scoped operations.

use std::{collections::HashSet, path::Path as LocalPath, sync::Arc};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::{StreamExt, TryStreamExt, future, stream::BoxStream};
use object_store::{
  Attribute, Attributes, ObjectStore, PutOptions, PutPayload, path::Path,
};

use crate::{
  Error, Result,
  address::{DEFAULT_URL_HOST, public_url},
  connector::{Acl, Connector, Credentials},
  upload::{UploadOptions, UploadSource},
};

/// Client for one bucket, with every path resolved under `base_dir`.
///
/// Holds two handles onto the bucket: one whose writes are private and one
/// whose writes carry the public-read ACL. Reads go through the private one.
#[derive(Clone)]
pub struct ObjectStoreClient {
  bucket:   String,
  base_dir: String,
  host:     String,
  private:  Arc<dyn ObjectStore>,
  public:   Arc<dyn ObjectStore>,
}

impl std::fmt::Debug for ObjectStoreClient {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ObjectStoreClient")
      .field("bucket", &self.bucket)
      .field("base_dir", &self.base_dir)
      .field("host", &self.host)
      .finish_non_exhaustive()
  }
}

enum Entry {
  File(String),
  Dir(String),
}

impl ObjectStoreClient {
  pub fn connect(
    connector: &dyn Connector,
    credentials: &Credentials,
    bucket: &str,
    base_dir: Option<&str>,
  ) -> Result<Self> {
    Ok(Self {
      bucket:   bucket.to_owned(),
      base_dir: base_dir.unwrap_or_default().trim_matches('/').to_owned(),
      host:     DEFAULT_URL_HOST.to_owned(),
      private:  connector.connect(credentials, bucket, Acl::Private)?,
      public:   connector.connect(credentials, bucket, Acl::PublicRead)?,
    })
  }

  /// Use a provider URL host other than AWS S3's for [`Self::get_url`].
  pub fn with_host(mut self, host: impl Into<String>) -> Self {
    self.host = host.into();
    self
  }

  pub fn bucket(&self) -> &str { &self.bucket }

  pub fn base_dir(&self) -> &str { &self.base_dir }

  pub fn host(&self) -> &str { &self.host }

  /// Resolve a relative path under the base directory.
  pub fn remote(&self, path: &str) -> Path {
    Path::from_iter(
      [self.base_dir.as_str(), path]
        .into_iter()
        .flat_map(|part| part.split('/'))
        .filter(|segment| !segment.is_empty()),
    )
  }

  // ─── Listing ───────────────────────────────────────────────────────────────

  /// Basenames directly under `prefix`. Each call starts a fresh listing,
  /// fetched page by page as the stream is polled.
  pub fn list(
    &self,
    prefix: &str,
    include_dirs: bool,
    include_files: bool,
  ) -> BoxStream<'static, Result<String>> {
    let prefix = self.remote(prefix);
    let scope = prefix.clone();
    let listing = if prefix.as_ref().is_empty() {
      self.private.list(None)
    } else {
      self.private.list(Some(&prefix))
    };

    let mut seen_dirs = HashSet::new();
    listing
      .map_err(Error::from)
      .try_filter_map(move |meta| {
        let name = match classify(&scope, &meta.location) {
          Some(Entry::File(name)) if include_files => Some(name),
          Some(Entry::Dir(name)) if include_dirs && seen_dirs.insert(name.clone()) => {
            Some(name)
          }
          _ => None,
        };
        future::ready(Ok(name))
      })
      .boxed()
  }

  // ─── Writes ────────────────────────────────────────────────────────────────

  /// Upload `source` to `remote`, or to the source file's basename when
  /// `remote` is absent. Returns the resolved object path.
  #[tracing::instrument(skip(self, source, options), fields(bucket = %self.bucket))]
  pub async fn upload(
    &self,
    source: UploadSource<'_>,
    remote: Option<&str>,
    options: UploadOptions,
  ) -> Result<String> {
    let loaded = source.load().await?;
    let remote = remote
      .map(str::to_owned)
      .or(loaded.file_name)
      .ok_or(Error::MissingRemotePath)?;
    let location = self.remote(&remote);

    let content_type = options.content_type.clone().unwrap_or(loaded.content_type);
    let mut attributes = Attributes::new();
    attributes.insert(Attribute::ContentType, content_type.into());
    if let Some(disposition) = options.content_disposition() {
      attributes.insert(Attribute::ContentDisposition, disposition.into());
    }
    let opts = PutOptions { attributes, ..PutOptions::default() };

    let store = if options.public { &self.public } else { &self.private };
    let size = loaded.data.len();
    store
      .put_opts(&location, PutPayload::from_bytes(loaded.data), opts)
      .await?;

    tracing::debug!(%location, size, public = options.public, "uploaded object");
    Ok(location.to_string())
  }

  /// Remove an object. Deleting a missing object succeeds.
  pub async fn delete(&self, remote: &str) -> Result<()> {
    match self.private.delete(&self.remote(remote)).await {
      Ok(()) | Err(object_store::Error::NotFound { .. }) => Ok(()),
      Err(e) => Err(e.into()),
    }
  }

  // ─── Reads ─────────────────────────────────────────────────────────────────

  /// Write the object to `local`, creating or truncating the file.
  #[tracing::instrument(skip(self, local), fields(bucket = %self.bucket))]
  pub async fn download(&self, local: &LocalPath, remote: &str) -> Result<()> {
    let data = self.download_object(remote).await?;
    tokio::fs::write(local, &data).await?;
    tracing::debug!(local = %local.display(), size = data.len(), "downloaded object");
    Ok(())
  }

  pub async fn download_object(&self, remote: &str) -> Result<Bytes> {
    let result = self.private.get(&self.remote(remote)).await?;
    Ok(result.bytes().await?)
  }

  pub async fn last_modified(&self, remote: &str) -> Result<DateTime<Utc>> {
    Ok(self.private.head(&self.remote(remote)).await?.last_modified)
  }

  /// Whether a metadata fetch for the object succeeds. Errors other than
  /// not-found are returned.
  pub async fn exists(&self, remote: &str) -> Result<bool> {
    match self.private.head(&self.remote(remote)).await {
      Ok(_) => Ok(true),
      Err(object_store::Error::NotFound { .. }) => Ok(false),
      Err(e) => Err(e.into()),
    }
  }

  /// Public URL of the object at `remote`.
  pub fn get_url(&self, remote: &str) -> String {
    public_url(&self.host, &self.bucket, &[&self.base_dir, remote])
  }
}

fn classify(prefix: &Path, location: &Path) -> Option<Entry> {
  let parts = location
    .prefix_match(prefix)?
    .map(|part| part.as_ref().to_owned())
    .collect::<Vec<_>>();
  match parts.as_slice() {
    [] => None,
    [file] => Some(Entry::File(file.clone())),
    [dir, ..] => Some(Entry::Dir(dir.clone())),
  }
}
