//! [`DeliveryContext`]: everything a transport run needs, resolved once.

use srt_core::{
  delivery::{Delivery, basename, dirname, join_path},
  history::{DeliveryHistory, ReportHistory},
  store::BackofficeStore,
  target::Target,
};
use srt_objstore::ObjectUrl;
use uuid::Uuid;

use crate::{Error, Result};

/// Immutable state of one delivery attempt.
#[derive(Debug, Clone)]
pub struct DeliveryContext {
  pub history_id:      Uuid,
  pub delivery:        Delivery,
  pub target:          Target,
  pub report_history:  ReportHistory,
  /// Public URL of the report artifact.
  pub source_url:      String,
  /// Full path of the delivered file on the target.
  pub destination:     String,
  pub destination_dir: String,
  /// Name of the staged file.
  pub filename:        String,
}

impl DeliveryContext {
  /// Load the rows behind `history` and derive source and destination.
  pub async fn configure<S: BackofficeStore>(
    store: &S,
    history: &DeliveryHistory,
    url_host: &str,
  ) -> Result<Self> {
    let history_id = history.delivery_history_id;

    let delivery_id = history
      .delivery_id
      .ok_or(Error::HistoryWithoutDelivery(history_id))?;
    let delivery = store
      .get_delivery(delivery_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::DeliveryNotFound(delivery_id))?;

    let target_id = delivery
      .target_id
      .ok_or(Error::DeliveryWithoutTarget(delivery_id))?;
    let target = store
      .get_target(target_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::TargetNotFound(target_id))?;

    let report_history_id = history
      .report_history_id
      .ok_or(Error::HistoryWithoutReportHistory(history_id))?;
    let report_history = store
      .get_report_history(report_history_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::ReportHistoryNotFound(report_history_id))?;
    let source_url = report_history
      .path
      .clone()
      .ok_or(Error::ArtifactMissing(report_history_id))?;

    let location = delivery.fullpath(&target);
    let (destination, filename) = if names_directory(delivery.path.as_deref()) {
      let source = ObjectUrl::parse(&source_url, url_host)?;
      let filename = basename(&source.key).to_owned();
      (join_path([location.as_str(), filename.as_str()]), filename)
    } else {
      let filename = basename(&location).to_owned();
      (location, filename)
    };
    let destination_dir = dirname(&destination).to_owned();

    Ok(Self {
      history_id,
      delivery,
      target,
      report_history,
      source_url,
      destination,
      destination_dir,
      filename,
    })
  }
}

/// A delivery without a path, or with one ending in `/`, points at a
/// directory: the artifact keeps its own name inside it.
fn names_directory(path: Option<&str>) -> bool {
  path.is_none_or(|p| p.trim().is_empty() || p.ends_with('/'))
}
