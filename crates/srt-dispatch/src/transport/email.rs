use std::path::Path;

use super::{Deliver, NOT_IMPLEMENTED};
use crate::{DeliveryContext, Result, Storage};

/// Mails the artifact (or a link to it, without `include_attachment`) to the
/// target's recipients. Not implemented yet: nothing is sent and the attempt
/// completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EmailTransport;

impl Deliver for EmailTransport {
  async fn deliver(
    &self,
    ctx: &DeliveryContext,
    _staged: &Path,
    _storage: &Storage,
  ) -> Result<Option<String>> {
    tracing::warn!(
      recipients = ctx.target.email_list().len(),
      attachment = ctx.target.include_attachment,
      "email delivery is not implemented; skipping"
    );
    Ok(None)
  }

  fn destination(&self, _ctx: &DeliveryContext) -> String { NOT_IMPLEMENTED.to_owned() }
}
