//! Transports push a staged report artifact to a delivery target.
//!
//! [`run`] is the shared runner: it resolves the [`DeliveryContext`], moves
//! the history row through its states, stages the artifact in a scratch
//! directory and hands the staged file to the variant's [`Deliver`] impl.
//! Whatever happens ends up on the history row.

mod email;
mod ftp;
mod object_store;
mod sftp;

use std::{future::Future, path::{Path, PathBuf}};

use srt_core::{
  history::{DeliveryHistory, HistoryUpdate},
  status::Status,
  store::BackofficeStore,
  target::TargetKind,
};
use srt_objstore::ObjectUrl;
use uuid::Uuid;

pub use self::{
  email::EmailTransport, ftp::FtpTransport, object_store::ObjectStoreTransport,
  sftp::SftpTransport,
};
use crate::{DeliveryContext, Error, Result, Storage};

/// Destination text of transports that do not push anywhere yet.
pub const NOT_IMPLEMENTED: &str = "Not Implemented";

/// Variant-specific half of a transport.
pub trait Deliver {
  /// Push `staged` to the context's destination. Returns the URL of the
  /// delivered artifact when the destination has one.
  fn deliver(
    &self,
    ctx: &DeliveryContext,
    staged: &Path,
    storage: &Storage,
  ) -> impl Future<Output = Result<Option<String>>> + Send;

  /// Human-readable destination, used in the completion message.
  fn destination(&self, ctx: &DeliveryContext) -> String;
}

/// The closed set of transports, one per [`TargetKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
  ObjectStore(ObjectStoreTransport),
  Ftp(FtpTransport),
  Sftp(SftpTransport),
  Email(EmailTransport),
}

impl Transport {
  pub fn for_kind(kind: TargetKind) -> Self {
    match kind {
      TargetKind::S3 => Self::ObjectStore(ObjectStoreTransport),
      TargetKind::Ftp => Self::Ftp(FtpTransport),
      TargetKind::Sftp => Self::Sftp(SftpTransport),
      TargetKind::Email => Self::Email(EmailTransport),
    }
  }

  pub fn kind(self) -> TargetKind {
    match self {
      Self::ObjectStore(_) => TargetKind::S3,
      Self::Ftp(_) => TargetKind::Ftp,
      Self::Sftp(_) => TargetKind::Sftp,
      Self::Email(_) => TargetKind::Email,
    }
  }
}

impl Deliver for Transport {
  async fn deliver(
    &self,
    ctx: &DeliveryContext,
    staged: &Path,
    storage: &Storage,
  ) -> Result<Option<String>> {
    match self {
      Self::ObjectStore(t) => t.deliver(ctx, staged, storage).await,
      Self::Ftp(t) => t.deliver(ctx, staged, storage).await,
      Self::Sftp(t) => t.deliver(ctx, staged, storage).await,
      Self::Email(t) => t.deliver(ctx, staged, storage).await,
    }
  }

  fn destination(&self, ctx: &DeliveryContext) -> String {
    match self {
      Self::ObjectStore(t) => t.destination(ctx),
      Self::Ftp(t) => t.destination(ctx),
      Self::Sftp(t) => t.destination(ctx),
      Self::Email(t) => t.destination(ctx),
    }
  }
}

// ─── Runner ──────────────────────────────────────────────────────────────────

/// Execute one delivery attempt for the history row `history_id`.
///
/// Never fails: errors are written to the row as `failed`. Only a missing
/// row, which has nowhere to record anything, is merely logged.
#[tracing::instrument(skip(store, storage), fields(kind = %transport.kind()))]
pub async fn run<S: BackofficeStore>(
  transport: Transport,
  store: &S,
  storage: &Storage,
  history_id: Uuid,
) {
  let history = match store.get_delivery_history(history_id).await {
    Ok(Some(history)) => history,
    Ok(None) => {
      tracing::error!("delivery history not found; nothing to record");
      return;
    }
    Err(e) => {
      tracing::error!(error = %e, "failed to load delivery history");
      return;
    }
  };

  let update = match attempt(transport, store, storage, &history).await {
    Ok(update) => update,
    Err(e) => {
      tracing::warn!(error = %e, "delivery failed");
      HistoryUpdate::failed(e.to_string())
    }
  };

  match store.update_delivery_history(history_id, update).await {
    Ok(history) => tracing::info!(status = %history.status, "delivery finished"),
    Err(e) => tracing::error!(error = %e, "failed to record delivery outcome"),
  }
}

/// Everything between loading the row and recording the outcome. The
/// scratch directory lives exactly as long as this call.
async fn attempt<S: BackofficeStore>(
  transport: Transport,
  store: &S,
  storage: &Storage,
  history: &DeliveryHistory,
) -> Result<HistoryUpdate> {
  let ctx = DeliveryContext::configure(store, history, storage.url_host()).await?;
  let scratch = storage.scratch_dir()?;

  store
    .update_delivery_history(ctx.history_id, HistoryUpdate::status(Status::Processing))
    .await
    .map_err(Error::store)?;

  let staged = prepare(&ctx, store, storage, scratch.path()).await?;
  let url = transport.deliver(&ctx, &staged, storage).await?;

  let mut update =
    HistoryUpdate::completed(format!("delivered to {}", transport.destination(&ctx)));
  if let Some(url) = url {
    update = update.with_artifact_url(url);
  }

  if let Err(e) = scratch.close() {
    tracing::warn!(error = %e, "failed to remove scratch directory");
  }
  Ok(update)
}

/// Download the report artifact into `scratch` under the context filename.
async fn prepare<S: BackofficeStore>(
  ctx: &DeliveryContext,
  store: &S,
  storage: &Storage,
  scratch: &Path,
) -> Result<PathBuf> {
  store
    .update_delivery_history(ctx.history_id, HistoryUpdate::msg("preparing"))
    .await
    .map_err(Error::store)?;

  let source = ObjectUrl::parse(&ctx.source_url, storage.url_host())?;
  let client = storage.system_client(&source.bucket, Some(&source.base_dir))?;
  let staged = scratch.join(&ctx.filename);
  client.download(&staged, &source.key).await?;

  tracing::debug!(source = %ctx.source_url, staged = %staged.display(), "staged artifact");
  Ok(staged)
}
