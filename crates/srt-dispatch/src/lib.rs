//! Report generation and delivery dispatch.
//!
//! The [`Launcher`] creates history rows and enqueues tasks; a [`Worker`]
//! pulled from the [`queue`] executes them: report jobs render and upload
//! artifacts, transports forward those artifacts to delivery targets. Every
//! outcome of a task lands on its history row, never on the job runner.

mod context;
mod launch;
mod storage;
mod worker;

pub mod error;
pub mod queue;
pub mod report;
pub mod transport;

pub use context::DeliveryContext;
pub use error::{Error, Result};
pub use launch::Launcher;
pub use queue::{Envelope, JobQueue, JobReceiver, TaskHandler};
pub use storage::Storage;
pub use transport::{Deliver, Transport};
pub use worker::Worker;

#[cfg(test)]
mod tests;
