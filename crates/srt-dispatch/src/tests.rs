//! End-to-end tests of launching, report jobs and transports against an
//! in-memory store, in-memory buckets and a temporary scratch root.

use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::{Value, json};
use srt_core::{
  delivery::NewDelivery,
  history::{HistoryUpdate, NewReportHistory, ReportHistory},
  report::{DateRange, NewReport, Report, ReportUid},
  status::Status,
  store::BackofficeStore,
  target::{NewTarget, Target, TargetKind},
  task::{JobRunner, Task},
};
use srt_objstore::{Credentials, MemoryConnector, ObjectStoreClient, UploadSource};
use srt_store_sqlite::SqliteStore;
use tempfile::TempDir;
use uuid::Uuid;

use crate::{JobQueue, JobReceiver, Launcher, Storage, Worker, queue};

const REPORTS_BUCKET: &str = "reports-bucket";
const CSV_ROW: &[u8] = b"Full Name,system@gmail.com,10\r\n";

struct Harness {
  store:     Arc<SqliteStore>,
  launcher:  Launcher<SqliteStore, JobQueue>,
  rx:        JobReceiver,
  worker:    Worker<SqliteStore, JobQueue>,
  connector: Arc<MemoryConnector>,
  scratch:   TempDir,
}

impl Harness {
  async fn new() -> Self {
    let store = Arc::new(SqliteStore::open_in_memory().await.expect("in-memory store"));
    let (queue, rx) = queue::channel();
    let launcher = Launcher::new(Arc::clone(&store), Arc::new(queue));
    let connector = Arc::new(MemoryConnector::new());
    let scratch = tempfile::tempdir().unwrap();
    let storage = Storage::new(connector.clone(), Credentials::default(), REPORTS_BUCKET, "test")
      .with_scratch_root(scratch.path().join("work"));
    let worker = Worker::new(launcher.clone(), storage);
    Self { store, launcher, rx, worker, connector, scratch }
  }

  /// Run queued tasks until the queue is empty.
  async fn drain(&mut self) -> usize { self.rx.drain(&self.worker).await }

  fn bucket(&self, name: &str) -> ObjectStoreClient {
    ObjectStoreClient::connect(self.connector.as_ref(), &Credentials::default(), name, None)
      .unwrap()
  }

  fn scratch_is_empty(&self) -> bool {
    match std::fs::read_dir(self.scratch.path().join("work")) {
      Ok(mut entries) => entries.next().is_none(),
      Err(e) => e.kind() == std::io::ErrorKind::NotFound,
    }
  }

  async fn report(&self, params: Value) -> Report {
    let mut input = NewReport::new(ReportUid::Report1, "daily");
    input.params = params.as_object().cloned().unwrap_or_default();
    self.store.add_report(input).await.unwrap()
  }

  async fn target(&self, kind: TargetKind, path: Option<&str>) -> Target {
    let input = NewTarget {
      path: path.map(str::to_owned),
      username: Some("AKIA".into()),
      password: Some("s3cret".into()),
      emails: Some("ops@example.com".into()),
      ..NewTarget::new(format!("{kind} target"), kind)
    };
    self.store.add_target(input).await.unwrap()
  }

  async fn deliver_to(&self, report: &Report, target: &Target, path: Option<&str>) -> Uuid {
    let mut input = NewDelivery::new(report.report_id, target.target_id);
    input.path = path.map(str::to_owned);
    self.store.add_delivery(input).await.unwrap().delivery_id
  }

  /// A report history that already points at an artifact URL.
  async fn finished_run(&self, report: &Report, artifact_url: &str) -> ReportHistory {
    let history = self
      .store
      .add_report_history(NewReportHistory {
        report_id: report.report_id,
        params:    "{}".into(),
        task_id:   None,
      })
      .await
      .unwrap();
    self
      .store
      .update_report_history(
        history.report_history_id,
        HistoryUpdate::default().with_artifact_url(artifact_url),
      )
      .await
      .unwrap()
  }
}

fn date(s: &str) -> NaiveDate { s.parse().unwrap() }

// ─── Launching ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn launch_report_records_task_and_merges_range() {
  let h = Harness::new().await;
  let report = h.report(json!({ "start_date": "2020-01-01", "region": "eu" })).await;

  let range = DateRange::from_bounds(Some(date("2024-01-01")), Some(date("2024-01-31")));
  let history = h.launcher.launch_report(report.report_id, range).await.unwrap();

  assert_eq!(history.status, Status::Pending);
  assert!(history.task_id.is_some());

  let params: Value = serde_json::from_str(&history.params).unwrap();
  assert_eq!(params["start_date"], "2020-01-01");
  assert_eq!(params["end_date"], "2024-01-31");
  assert_eq!(params["region"], "eu");
}

#[tokio::test]
async fn launch_unknown_report_fails() {
  let h = Harness::new().await;
  let err = h.launcher.launch_report(Uuid::new_v4(), None).await.unwrap_err();
  assert!(matches!(err, crate::Error::ReportNotFound(_)));
}

#[tokio::test]
async fn inactive_deliveries_are_not_dispatched() {
  let h = Harness::new().await;
  let report = h.report(json!({})).await;
  let target = h.target(TargetKind::Email, None).await;
  let active = h.deliver_to(&report, &target, None).await;
  let inactive = h
    .store
    .add_delivery(NewDelivery::new(report.report_id, target.target_id).inactive())
    .await
    .unwrap()
    .delivery_id;
  let run = h.finished_run(&report, "https://b.s3.amazonaws.com/test/a.csv").await;

  let launched = h.launcher.deliver(&run).await.unwrap();
  assert_eq!(launched.len(), 1);
  assert_eq!(launched[0].delivery_id, Some(active));
  assert_eq!(launched[0].status, Status::Pending);
  assert!(launched[0].task_id.is_some());

  assert!(h.store.list_delivery_histories(Some(inactive)).await.unwrap().is_empty());
}

#[tokio::test]
async fn fan_out_records_deliveries_whose_target_is_gone() {
  let mut h = Harness::new().await;
  let report = h.report(json!({})).await;
  let target = h.target(TargetKind::Email, None).await;
  let doomed = h.target(TargetKind::Ftp, None).await;
  let healthy = h.deliver_to(&report, &target, None).await;
  let orphan = h.deliver_to(&report, &doomed, None).await;
  h.store.delete_target(doomed.target_id).await.unwrap();
  let run = h.finished_run(&report, "https://b.s3.amazonaws.com/test/a.csv").await;

  let launched = h.launcher.deliver(&run).await.unwrap();
  assert_eq!(launched.len(), 2);

  let attempts = h.store.list_delivery_histories(Some(orphan)).await.unwrap();
  assert_eq!(attempts.len(), 1);
  assert_eq!(attempts[0].status, Status::Failed);
  assert_eq!(
    attempts[0].msg.as_deref(),
    Some(format!("delivery {orphan} has no target").as_str())
  );
  assert!(attempts[0].task_id.is_none());

  let attempts = h.store.list_delivery_histories(Some(healthy)).await.unwrap();
  assert_eq!(attempts.len(), 1);
  assert_eq!(attempts[0].status, Status::Pending);
  assert!(attempts[0].task_id.is_some());

  // only the healthy delivery was queued
  assert_eq!(h.drain().await, 1);
}

// ─── Pipeline ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn report_run_delivers_to_object_store_target() {
  let mut h = Harness::new().await;
  let report = h.report(json!({})).await;
  let target = h.target(TargetKind::S3, Some("bucket1/reports")).await;
  let delivery_id = h.deliver_to(&report, &target, None).await;

  let run = h.launcher.launch_report(report.report_id, None).await.unwrap();
  // report job, then the delivery it fans out to
  assert_eq!(h.drain().await, 2);

  let run = h.store.get_report_history(run.report_history_id).await.unwrap().unwrap();
  assert_eq!(run.status, Status::Completed);
  let artifact = run.path.clone().unwrap();
  let prefix = format!("https://{REPORTS_BUCKET}.s3.amazonaws.com/test/report_{}/", report.report_id);
  assert!(artifact.starts_with(&prefix), "{artifact}");
  assert!(artifact.ends_with(".csv"));

  let key = artifact.strip_prefix(&format!("https://{REPORTS_BUCKET}.s3.amazonaws.com/")).unwrap();
  assert_eq!(&h.bucket(REPORTS_BUCKET).download_object(key).await.unwrap()[..], CSV_ROW);

  let attempts = h.store.list_delivery_histories(Some(delivery_id)).await.unwrap();
  assert_eq!(attempts.len(), 1);
  let attempt = &attempts[0];
  // completed is only reachable through processing
  assert_eq!(attempt.status, Status::Completed);
  // a delivery without a path drops the artifact into the target directory
  let name = artifact.rsplit('/').next().unwrap();
  let key = format!("reports/{name}");
  assert_eq!(attempt.msg.as_deref(), Some(format!("delivered to S3: bucket1/{key}").as_str()));
  assert_eq!(
    attempt.url.as_deref(),
    Some(format!("https://bucket1.s3.amazonaws.com/{key}").as_str())
  );
  assert_eq!(attempt.report_history_id, Some(run.report_history_id));

  let delivered = h.bucket("bucket1");
  assert!(delivered.exists(&key).await.unwrap());
  assert!(!delivered.exists("reports").await.unwrap());
  assert_eq!(&delivered.download_object(&key).await.unwrap()[..], CSV_ROW);

  assert!(h.scratch_is_empty());
}

#[tokio::test]
async fn delivery_path_extends_target_path() {
  let mut h = Harness::new().await;
  let report = h.report(json!({})).await;
  let target = h.target(TargetKind::S3, Some("/bucket1/reports/")).await;
  let delivery_id = h.deliver_to(&report, &target, Some("/daily/out.csv")).await;

  h.launcher.launch_report(report.report_id, None).await.unwrap();
  h.drain().await;

  let attempt = &h.store.list_delivery_histories(Some(delivery_id)).await.unwrap()[0];
  assert_eq!(attempt.status, Status::Completed);
  assert_eq!(attempt.msg.as_deref(), Some("delivered to S3: bucket1/reports/daily/out.csv"));
  assert!(h.bucket("bucket1").exists("reports/daily/out.csv").await.unwrap());
  assert!(h.scratch_is_empty());
}

#[tokio::test]
async fn trailing_slash_delivery_path_is_a_directory() {
  let mut h = Harness::new().await;
  let report = h.report(json!({})).await;
  let target = h.target(TargetKind::S3, Some("bucket1/reports/")).await;
  let delivery_id = h.deliver_to(&report, &target, Some("daily/")).await;
  let run = h.finished_run(&report, &format!("https://{REPORTS_BUCKET}.s3.amazonaws.com/test/report_x/a.csv")).await;
  h.bucket(REPORTS_BUCKET)
    .upload(UploadSource::Text("x,y\r\n"), Some("test/report_x/a.csv"), Default::default())
    .await
    .unwrap();

  h.launcher.deliver(&run).await.unwrap();
  assert_eq!(h.drain().await, 1);

  let attempt = &h.store.list_delivery_histories(Some(delivery_id)).await.unwrap()[0];
  assert_eq!(attempt.status, Status::Completed);
  assert_eq!(attempt.msg.as_deref(), Some("delivered to S3: bucket1/reports/daily/a.csv"));
  let delivered = h.bucket("bucket1");
  assert_eq!(&delivered.download_object("reports/daily/a.csv").await.unwrap()[..], b"x,y\r\n");
  assert!(!delivered.exists("reports/daily").await.unwrap());
  assert!(h.scratch_is_empty());
}

#[tokio::test]
async fn missing_source_object_fails_delivery() {
  let mut h = Harness::new().await;
  let report = h.report(json!({})).await;
  let target = h.target(TargetKind::S3, Some("bucket1/reports")).await;
  let delivery_id = h.deliver_to(&report, &target, None).await;
  let run = h
    .finished_run(&report, &format!("https://{REPORTS_BUCKET}.s3.amazonaws.com/test/report_x/gone.csv"))
    .await;

  h.launcher.deliver(&run).await.unwrap();
  assert_eq!(h.drain().await, 1);

  let attempt = &h.store.list_delivery_histories(Some(delivery_id)).await.unwrap()[0];
  assert_eq!(attempt.status, Status::Failed);
  let msg = attempt.msg.as_deref().unwrap_or_default();
  assert!(msg.contains("not found"), "{msg}");
  assert!(!h.bucket("bucket1").exists("reports/gone.csv").await.unwrap());
  assert!(h.scratch_is_empty());
}

#[tokio::test]
async fn object_store_and_email_deliveries_are_independent() {
  let mut h = Harness::new().await;
  let report = h.report(json!({})).await;
  let s3 = h.target(TargetKind::S3, Some("bucket1/reports")).await;
  let email = h.target(TargetKind::Email, None).await;
  let s3_delivery = h.deliver_to(&report, &s3, None).await;
  let email_delivery = h.deliver_to(&report, &email, None).await;

  h.launcher.launch_report(report.report_id, None).await.unwrap();
  assert_eq!(h.drain().await, 3);

  let s3_attempt = &h.store.list_delivery_histories(Some(s3_delivery)).await.unwrap()[0];
  assert_eq!(s3_attempt.status, Status::Completed);

  let email_attempts = h.store.list_delivery_histories(Some(email_delivery)).await.unwrap();
  assert_eq!(email_attempts.len(), 1);
  assert_eq!(email_attempts[0].status, Status::Completed);
  assert_eq!(email_attempts[0].msg.as_deref(), Some("delivered to Not Implemented"));
  assert_eq!(email_attempts[0].url, None);
  assert_ne!(s3_attempt.delivery_history_id, email_attempts[0].delivery_history_id);
  assert!(h.scratch_is_empty());
}

#[tokio::test]
async fn destination_without_bucket_fails() {
  let mut h = Harness::new().await;
  let report = h.report(json!({})).await;
  let target = h.target(TargetKind::S3, None).await;
  let delivery_id = h.deliver_to(&report, &target, Some("out.csv")).await;

  h.launcher.launch_report(report.report_id, None).await.unwrap();
  h.drain().await;

  let attempt = &h.store.list_delivery_histories(Some(delivery_id)).await.unwrap()[0];
  assert_eq!(attempt.status, Status::Failed);
  assert!(attempt.msg.as_deref().unwrap_or_default().contains("bucket/path"));
  assert!(h.scratch_is_empty());
}

#[tokio::test]
async fn unresolvable_delivery_fails_its_history() {
  let mut h = Harness::new().await;
  let report = h.report(json!({})).await;
  let target = h.target(TargetKind::Sftp, None).await;
  let delivery_id = h.deliver_to(&report, &target, Some("out.csv")).await;
  let run = h.finished_run(&report, "https://b.s3.amazonaws.com/test/a.csv").await;

  h.launcher.deliver(&run).await.unwrap();
  // the target disappears between dispatch and execution
  h.store.delete_target(target.target_id).await.unwrap();
  h.drain().await;

  let attempt = &h.store.list_delivery_histories(Some(delivery_id)).await.unwrap()[0];
  assert_eq!(attempt.status, Status::Failed);
  assert_eq!(
    attempt.msg.as_deref(),
    Some(format!("delivery {delivery_id} has no target").as_str())
  );
}

#[tokio::test]
async fn relaunch_creates_a_new_attempt() {
  let mut h = Harness::new().await;
  let report = h.report(json!({})).await;
  let target = h.target(TargetKind::S3, Some("bucket1/reports")).await;
  let delivery_id = h.deliver_to(&report, &target, None).await;
  let run = h
    .finished_run(&report, &format!("https://{REPORTS_BUCKET}.s3.amazonaws.com/test/report_x/gone.csv"))
    .await;

  let first = h.launcher.deliver(&run).await.unwrap().remove(0);
  h.drain().await;
  let first = h.store.get_delivery_history(first.delivery_history_id).await.unwrap().unwrap();
  assert_eq!(first.status, Status::Failed);

  // the artifact shows up; an operator retries
  h.bucket(REPORTS_BUCKET)
    .upload(
      UploadSource::Text("Full Name,system@gmail.com,10\r\n"),
      Some("test/report_x/gone.csv"),
      Default::default(),
    )
    .await
    .unwrap();
  let second = h.launcher.relaunch_delivery(first.delivery_history_id).await.unwrap();
  assert_ne!(second.delivery_history_id, first.delivery_history_id);
  h.drain().await;

  let attempts = h.store.list_delivery_histories(Some(delivery_id)).await.unwrap();
  assert_eq!(attempts.len(), 2);
  let second = h.store.get_delivery_history(second.delivery_history_id).await.unwrap().unwrap();
  assert_eq!(second.status, Status::Completed);
  let unchanged = h.store.get_delivery_history(first.delivery_history_id).await.unwrap().unwrap();
  assert_eq!(unchanged.status, Status::Failed);
  assert_eq!(unchanged.msg, first.msg);
}

// ─── Report jobs ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn scheduled_report_creates_its_own_history() {
  let mut h = Harness::new().await;
  let report = h.report(json!({ "b": 1, "a": 2 })).await;

  let task_id = h
    .launcher
    .runner()
    .enqueue(Task::ScheduledReport { report_id: report.report_id })
    .unwrap();
  assert_eq!(h.drain().await, 1);

  let runs = h.store.list_report_histories(Some(report.report_id)).await.unwrap();
  assert_eq!(runs.len(), 1);
  assert_eq!(runs[0].status, Status::Completed);
  assert_eq!(runs[0].task_id.as_deref(), Some(task_id.as_str()));
  assert_eq!(runs[0].params, "{\n  \"a\": 2,\n  \"b\": 1\n}");
  assert!(h.scratch_is_empty());
}

#[tokio::test]
async fn scheduled_run_of_missing_report_is_dropped() {
  let mut h = Harness::new().await;
  h.launcher
    .runner()
    .enqueue(Task::ScheduledReport { report_id: Uuid::new_v4() })
    .unwrap();
  assert_eq!(h.drain().await, 1);
  assert!(h.store.list_report_histories(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn failing_report_records_error_and_skips_deliveries() {
  let mut h = Harness::new().await;
  let report = h.report(json!({})).await;
  let target = h.target(TargetKind::Email, None).await;
  h.deliver_to(&report, &target, None).await;

  let run = h
    .store
    .add_report_history(NewReportHistory {
      report_id: report.report_id,
      params:    "[1, 2]".into(),
      task_id:   None,
    })
    .await
    .unwrap();
  h.launcher
    .runner()
    .enqueue(Task::GenerateReport { history_id: run.report_history_id })
    .unwrap();
  assert_eq!(h.drain().await, 1);

  let run = h.store.get_report_history(run.report_history_id).await.unwrap().unwrap();
  assert_eq!(run.status, Status::Failed);
  assert_eq!(run.msg.as_deref(), Some("report params must be a JSON object"));
  assert!(run.path.is_none());
  assert!(h.store.list_delivery_histories(None).await.unwrap().is_empty());
  assert!(h.scratch_is_empty());
}

#[tokio::test]
async fn tasks_for_missing_rows_are_absorbed() {
  let mut h = Harness::new().await;
  let runner = h.launcher.runner();
  runner
    .enqueue(Task::GenerateReport { history_id: Uuid::new_v4() })
    .unwrap();
  runner
    .enqueue(Task::Deliver { transport: TargetKind::S3, history_id: Uuid::new_v4() })
    .unwrap();
  assert_eq!(h.drain().await, 2);
}
