//! In-process job runner.
//!
//! [`JobQueue`] is the enqueue side handed to the launcher; [`JobReceiver`]
//! feeds queued tasks to a [`TaskHandler`], either on a bounded pool of tokio
//! tasks ([`JobReceiver::serve`]) or one by one until the queue is empty
//! ([`JobReceiver::drain`]).

use std::{future::Future, sync::Arc};

use srt_core::task::{JobRunner, Task, TaskId};
use tokio::{
  sync::{Semaphore, mpsc},
  task::{JoinError, JoinSet},
};
use uuid::Uuid;

/// A queued task together with the id it was enqueued under.
#[derive(Debug, Clone)]
pub struct Envelope {
  pub id:   TaskId,
  pub task: Task,
}

/// Executes queued tasks. Failures are recorded by the handler itself, so
/// there is nothing to report back.
pub trait TaskHandler: Send + Sync + 'static {
  fn handle(&self, envelope: Envelope) -> impl Future<Output = ()> + Send;
}

/// Sending half of the queue. Cloning shares the same queue.
#[derive(Debug, Clone)]
pub struct JobQueue {
  tx: mpsc::UnboundedSender<Envelope>,
}

/// Receiving half of the queue.
#[derive(Debug)]
pub struct JobReceiver {
  rx: mpsc::UnboundedReceiver<Envelope>,
}

/// Create a connected queue pair.
pub fn channel() -> (JobQueue, JobReceiver) {
  let (tx, rx) = mpsc::unbounded_channel();
  (JobQueue { tx }, JobReceiver { rx })
}

impl JobRunner for JobQueue {
  fn enqueue(&self, task: Task) -> srt_core::Result<TaskId> {
    let id = TaskId::new(Uuid::new_v4().to_string());
    let name = task.name();
    self
      .tx
      .send(Envelope { id: id.clone(), task })
      .map_err(|_| srt_core::Error::QueueClosed)?;
    tracing::debug!(task_id = %id, task = %name, "enqueued task");
    Ok(id)
  }
}

impl JobReceiver {
  /// Run tasks as they arrive, at most `concurrency` at a time, until every
  /// [`JobQueue`] has been dropped. Tasks still running at that point are
  /// awaited before returning. A handler that panics is logged and does not
  /// stop the others.
  pub async fn serve<H: TaskHandler>(mut self, handler: Arc<H>, concurrency: usize) {
    let limit = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut running = JoinSet::new();
    tracing::info!(concurrency = concurrency.max(1), "job worker started");

    loop {
      tokio::select! {
        received = self.rx.recv() => {
          let Some(envelope) = received else { break };
          let Ok(permit) = Arc::clone(&limit).acquire_owned().await else {
            break;
          };
          let handler = Arc::clone(&handler);
          running.spawn(async move {
            handler.handle(envelope).await;
            drop(permit);
          });
        }
        Some(joined) = running.join_next(), if !running.is_empty() => log_join(joined),
      }
    }

    if !running.is_empty() {
      tracing::info!(in_flight = running.len(), "job queue closed; waiting for running tasks");
    }
    while let Some(joined) = running.join_next().await {
      log_join(joined);
    }
    tracing::info!("job worker stopped");
  }

  /// Run every queued task in order, including tasks enqueued while
  /// draining, and return how many ran.
  pub async fn drain<H: TaskHandler>(&mut self, handler: &H) -> usize {
    let mut handled = 0;
    while let Ok(envelope) = self.rx.try_recv() {
      handler.handle(envelope).await;
      handled += 1;
    }
    handled
  }
}

fn log_join(joined: Result<(), JoinError>) {
  match joined {
    Ok(()) => {}
    Err(e) if e.is_panic() => tracing::error!(error = %e, "task handler panicked"),
    Err(e) => tracing::warn!(error = %e, "task handler was cancelled"),
  }
}
