use std::path::Path;

use super::{Deliver, NOT_IMPLEMENTED};
use crate::{DeliveryContext, Result, Storage};

/// FTP upload to `host`. Not implemented yet: the push is skipped and
/// the attempt completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FtpTransport;

impl Deliver for FtpTransport {
  async fn deliver(
    &self,
    ctx: &DeliveryContext,
    _staged: &Path,
    _storage: &Storage,
  ) -> Result<Option<String>> {
    tracing::warn!(
      host = ctx.target.host.as_deref().unwrap_or_default(),
      destination = %ctx.destination,
      "ftp push is not implemented; skipping"
    );
    Ok(None)
  }

  fn destination(&self, _ctx: &DeliveryContext) -> String { NOT_IMPLEMENTED.to_owned() }
}
