use std::path::Path;

use super::{Deliver, NOT_IMPLEMENTED};
use crate::{DeliveryContext, Result, Storage};

/// Upload over SSH to `path` on `host`.
// TODO: needs an SSH client and host-key policy before the push can happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SftpTransport;

impl Deliver for SftpTransport {
  async fn deliver(
    &self,
    ctx: &DeliveryContext,
    _staged: &Path,
    _storage: &Storage,
  ) -> Result<Option<String>> {
    tracing::warn!(host = ?ctx.target.host, "sftp push is not implemented; skipping");
    Ok(None)
  }

  fn destination(&self, _ctx: &DeliveryContext) -> String { NOT_IMPLEMENTED.to_owned() }
}
