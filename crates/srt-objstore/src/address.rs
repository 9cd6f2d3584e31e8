//! Public object URLs: `https://{bucket}.{host}/{base_dir}/{key}`.

use url::Url;

use crate::{Error, Result};

/// Host suffix of AWS S3 virtual-hosted-style URLs.
pub const DEFAULT_URL_HOST: &str = "s3.amazonaws.com";

/// Build the public URL of `path` inside `bucket`. Every part is trimmed of
/// `/` and empty parts are dropped, so the result never holds `//` past the
/// scheme.
pub fn public_url(host: &str, bucket: &str, parts: &[&str]) -> String {
  let root = format!("https://{}.{}", bucket.trim_matches('/'), host.trim_matches('/'));
  std::iter::once(root.as_str())
    .chain(parts.iter().map(|part| part.trim_matches('/')))
    .filter(|part| !part.is_empty())
    .collect::<Vec<_>>()
    .join("/")
}

/// A public object URL split back into its addressing parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectUrl {
  pub bucket:   String,
  /// First path segment; the base directory the object was written under.
  pub base_dir: String,
  /// Everything after the base directory.
  pub key:      String,
}

impl ObjectUrl {
  /// Parse a URL produced by [`public_url`] for the given provider `host`.
  /// Both `http` and `https` are accepted.
  pub fn parse(raw: &str, host: &str) -> Result<Self> {
    let invalid = |reason: &str| Error::InvalidUrl {
      url:    raw.to_owned(),
      reason: reason.to_owned(),
    };

    let url = Url::parse(raw).map_err(|e| invalid(&e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
      return Err(invalid("unsupported scheme"));
    }

    let suffix = format!(".{}", host.trim_matches('/'));
    let bucket = url
      .host_str()
      .and_then(|h| h.strip_suffix(&suffix))
      .filter(|b| !b.is_empty())
      .ok_or_else(|| invalid("host is not a bucket of the object store"))?;

    let mut segments = url
      .path_segments()
      .into_iter()
      .flatten()
      .filter(|s| !s.is_empty());
    let base_dir = segments
      .next()
      .ok_or_else(|| invalid("missing base directory"))?;
    let key = segments.collect::<Vec<_>>().join("/");
    if key.is_empty() {
      return Err(invalid("missing object key"));
    }

    Ok(Self {
      bucket:   bucket.to_owned(),
      base_dir: base_dir.to_owned(),
      key,
    })
  }
}
