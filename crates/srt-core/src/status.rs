//! The lifecycle shared by report runs and delivery attempts.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{Error, Result};

/// Where a history row is in its lifecycle.
///
/// `pending → processing → completed | failed`. A row may also fail straight
/// from `pending` when it cannot be configured. Nothing ever moves backwards
/// and terminal rows never change status again.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Status {
  #[default]
  Pending,
  Processing,
  Completed,
  Failed,
}

impl Status {
  pub fn is_terminal(self) -> bool {
    matches!(self, Self::Completed | Self::Failed)
  }

  pub fn can_transition_to(self, next: Status) -> bool {
    matches!(
      (self, next),
      (Self::Pending, Self::Processing)
        | (Self::Pending, Self::Failed)
        | (Self::Processing, Self::Completed)
        | (Self::Processing, Self::Failed)
    )
  }

  /// Validate a move from `self` to `next`.
  pub fn transition(self, next: Status) -> Result<Status> {
    if self.can_transition_to(next) {
      Ok(next)
    } else {
      Err(Error::InvalidTransition { from: self, to: next })
    }
  }
}
