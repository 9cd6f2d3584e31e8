use std::path::Path;

use srt_objstore::{UploadOptions, UploadSource};

use super::Deliver;
use crate::{DeliveryContext, Error, Result, Storage};

/// Uploads to a bucket with the target's own key pair. The destination is
/// `bucket/path`, with `path` taken as the object key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ObjectStoreTransport;

impl Deliver for ObjectStoreTransport {
  async fn deliver(
    &self,
    ctx: &DeliveryContext,
    staged: &Path,
    storage: &Storage,
  ) -> Result<Option<String>> {
    let (bucket, key) = ctx
      .destination
      .trim_matches('/')
      .split_once('/')
      .filter(|(bucket, key)| !bucket.is_empty() && !key.is_empty())
      .ok_or_else(|| Error::InvalidDestination(ctx.destination.clone()))?;

    let credentials =
      storage.target_credentials(ctx.target.username.clone(), ctx.target.password.clone());
    let client = storage.client(&credentials, bucket, None)?;
    client
      .upload(UploadSource::File(staged), Some(key), UploadOptions::default())
      .await?;
    Ok(Some(client.get_url(key)))
  }

  fn destination(&self, ctx: &DeliveryContext) -> String {
    format!("S3: {}", ctx.destination)
  }
}
