//! Integration tests for `SqliteStore` against an in-memory database.

use serde_json::json;
use srt_core::{
  delivery::NewDelivery,
  history::{HistoryUpdate, NewReportHistory},
  report::{NewReport, Report, ReportUid},
  status::Status,
  store::BackofficeStore,
  target::{NewTarget, TargetKind},
};
use uuid::Uuid;

use crate::{Error, SecretKey, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn report(s: &SqliteStore, name: &str) -> Report {
  s.add_report(NewReport::new(ReportUid::Report1, name)).await.unwrap()
}

fn s3_target(name: &str) -> NewTarget {
  NewTarget {
    path: Some("bucket1/reports".into()),
    username: Some("AKIA".into()),
    password: Some("s3cret".into()),
    ..NewTarget::new(name, TargetKind::S3)
  }
}

// ─── Targets ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_get_target() {
  let s = store().await;
  let target = s.add_target(s3_target("archive")).await.unwrap();

  let fetched = s.get_target(target.target_id).await.unwrap().unwrap();
  assert_eq!(fetched.name, "archive");
  assert_eq!(fetched.kind, TargetKind::S3);
  assert_eq!(fetched.path.as_deref(), Some("bucket1/reports"));
  assert_eq!(fetched.password.as_deref(), Some("s3cret"));
  assert!(!fetched.include_attachment);
}

#[tokio::test]
async fn get_target_missing_returns_none() {
  let s = store().await;
  assert!(s.get_target(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn list_targets_ordered_by_name() {
  let s = store().await;
  s.add_target(NewTarget::new("zeta", TargetKind::Ftp)).await.unwrap();
  s.add_target(NewTarget::new("alpha", TargetKind::Email)).await.unwrap();

  let names: Vec<_> = s.list_targets().await.unwrap().into_iter().map(|t| t.name).collect();
  assert_eq!(names, ["alpha", "zeta"]);
}

#[tokio::test]
async fn passwords_are_sealed_on_disk() {
  let dir = tempfile::tempdir().unwrap();
  let db = dir.path().join("srt.db");
  let key = SecretKey::generate();

  let target_id = {
    let s = SqliteStore::open(&db, &key).await.unwrap();
    s.add_target(s3_target("archive")).await.unwrap().target_id
  };

  let raw = rusqlite::Connection::open(&db).unwrap();
  let stored: String = raw
    .query_row("SELECT password FROM targets", [], |r| r.get(0))
    .unwrap();
  assert!(!stored.contains("s3cret"));

  let reopened = SqliteStore::open(&db, &key).await.unwrap();
  let target = reopened.get_target(target_id).await.unwrap().unwrap();
  assert_eq!(target.password.as_deref(), Some("s3cret"));

  let wrong_key = SqliteStore::open(&db, &SecretKey::generate()).await.unwrap();
  assert!(matches!(wrong_key.get_target(target_id).await, Err(Error::Crypto(_))));
}

#[tokio::test]
async fn delete_target_clears_delivery_reference() {
  let s = store().await;
  let report = report(&s, "daily").await;
  let target = s.add_target(s3_target("archive")).await.unwrap();
  let delivery = s
    .add_delivery(NewDelivery::new(report.report_id, target.target_id))
    .await
    .unwrap();

  assert!(s.delete_target(target.target_id).await.unwrap());
  assert!(!s.delete_target(target.target_id).await.unwrap());

  let delivery = s.get_delivery(delivery.delivery_id).await.unwrap().unwrap();
  assert_eq!(delivery.target_id, None);
  assert_eq!(delivery.report_id, Some(report.report_id));
}

// ─── Deliveries ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn active_deliveries_skip_inactive_and_other_reports() {
  let s = store().await;
  let daily = report(&s, "daily").await;
  let weekly = report(&s, "weekly").await;
  let target = s.add_target(s3_target("archive")).await.unwrap();

  let active = s
    .add_delivery(NewDelivery::new(daily.report_id, target.target_id).with_path("a.csv"))
    .await
    .unwrap();
  s.add_delivery(NewDelivery::new(daily.report_id, target.target_id).inactive())
    .await
    .unwrap();
  s.add_delivery(NewDelivery::new(weekly.report_id, target.target_id))
    .await
    .unwrap();

  let found = s.active_deliveries(daily.report_id).await.unwrap();
  assert_eq!(found.len(), 1);
  assert_eq!(found[0].delivery_id, active.delivery_id);
  assert_eq!(found[0].path.as_deref(), Some("a.csv"));

  assert_eq!(s.list_deliveries(Some(daily.report_id)).await.unwrap().len(), 2);
  assert_eq!(s.list_deliveries(None).await.unwrap().len(), 3);
}

#[tokio::test]
async fn list_deliveries_newest_first() {
  let s = store().await;
  let daily = report(&s, "daily").await;
  let target = s.add_target(s3_target("archive")).await.unwrap();
  let first = s
    .add_delivery(NewDelivery::new(daily.report_id, target.target_id))
    .await
    .unwrap();
  let second = s
    .add_delivery(NewDelivery::new(daily.report_id, target.target_id))
    .await
    .unwrap();

  let ids: Vec<_> = s
    .list_deliveries(None)
    .await
    .unwrap()
    .into_iter()
    .map(|d| d.delivery_id)
    .collect();
  assert_eq!(ids, [second.delivery_id, first.delivery_id]);
}

#[tokio::test]
async fn toggle_delivery_activation() {
  let s = store().await;
  let daily = report(&s, "daily").await;
  let target = s.add_target(s3_target("archive")).await.unwrap();
  let delivery = s
    .add_delivery(NewDelivery::new(daily.report_id, target.target_id))
    .await
    .unwrap();

  let updated = s
    .set_delivery_active(delivery.delivery_id, false)
    .await
    .unwrap()
    .unwrap();
  assert!(!updated.is_active);
  assert!(s.active_deliveries(daily.report_id).await.unwrap().is_empty());

  assert!(s.set_delivery_active(Uuid::new_v4(), true).await.unwrap().is_none());
}

// ─── Reports ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn report_params_round_trip() {
  let s = store().await;
  let mut input = NewReport::new(ReportUid::Report2, "monthly");
  input.params = json!({ "region": "eu", "limit": 10 }).as_object().cloned().unwrap();
  let created = s.add_report(input).await.unwrap();

  let fetched = s.get_report(created.report_id).await.unwrap().unwrap();
  assert_eq!(fetched.uid, ReportUid::Report2);
  assert_eq!(fetched.params["region"], "eu");
  assert_eq!(fetched.params["limit"], 10);
}

#[tokio::test]
async fn search_reports_by_name_or_description() {
  let s = store().await;
  s.add_report(NewReport::new(ReportUid::Report1, "Daily Sales")).await.unwrap();
  let mut weekly = NewReport::new(ReportUid::Report1, "Weekly");
  weekly.description = Some("sales rollup".into());
  s.add_report(weekly).await.unwrap();
  s.add_report(NewReport::new(ReportUid::Report1, "Inventory")).await.unwrap();

  let found = s.list_reports(Some("SALES".into())).await.unwrap();
  let names: Vec<_> = found.iter().map(|r| r.name.as_str()).collect();
  assert_eq!(names, ["Daily Sales", "Weekly"]);

  assert_eq!(s.list_reports(None).await.unwrap().len(), 3);
  assert_eq!(s.list_reports(Some("  ".into())).await.unwrap().len(), 3);
}

#[tokio::test]
async fn delete_report_cascades_histories_and_clears_deliveries() {
  let s = store().await;
  let daily = report(&s, "daily").await;
  let target = s.add_target(s3_target("archive")).await.unwrap();
  let delivery = s
    .add_delivery(NewDelivery::new(daily.report_id, target.target_id))
    .await
    .unwrap();
  let history = s
    .add_report_history(NewReportHistory {
      report_id: daily.report_id,
      params:    "{}".into(),
      task_id:   None,
    })
    .await
    .unwrap();
  let attempt = s
    .add_delivery_history(history.report_history_id, delivery.delivery_id)
    .await
    .unwrap();

  assert!(s.delete_report(daily.report_id).await.unwrap());

  assert!(s.get_report_history(history.report_history_id).await.unwrap().is_none());
  let delivery = s.get_delivery(delivery.delivery_id).await.unwrap().unwrap();
  assert_eq!(delivery.report_id, None);
  let attempt = s
    .get_delivery_history(attempt.delivery_history_id)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(attempt.report_history_id, None);
}

// ─── Histories ───────────────────────────────────────────────────────────────

async fn pending_history(s: &SqliteStore) -> Uuid {
  let daily = report(s, "daily").await;
  s.add_report_history(NewReportHistory {
    report_id: daily.report_id,
    params:    "{}".into(),
    task_id:   Some("task-1".into()),
  })
  .await
  .unwrap()
  .report_history_id
}

#[tokio::test]
async fn report_history_moves_forward() {
  let s = store().await;
  let id = pending_history(&s).await;

  let h = s.get_report_history(id).await.unwrap().unwrap();
  assert_eq!(h.status, Status::Pending);
  assert_eq!(h.task_id.as_deref(), Some("task-1"));

  let h = s
    .update_report_history(id, HistoryUpdate::status(Status::Processing))
    .await
    .unwrap();
  assert_eq!(h.status, Status::Processing);

  let h = s
    .update_report_history(
      id,
      HistoryUpdate::completed("done").with_artifact_url("https://b.s3.amazonaws.com/d/a.csv"),
    )
    .await
    .unwrap();
  assert_eq!(h.status, Status::Completed);
  assert_eq!(h.msg.as_deref(), Some("done"));
  assert_eq!(h.path.as_deref(), Some("https://b.s3.amazonaws.com/d/a.csv"));
  assert_eq!(h.task_id.as_deref(), Some("task-1"));
  assert!(h.modified_at >= h.created_at);
}

#[tokio::test]
async fn backwards_and_terminal_transitions_rejected() {
  let s = store().await;
  let id = pending_history(&s).await;

  s.update_report_history(id, HistoryUpdate::status(Status::Processing))
    .await
    .unwrap();
  let err = s
    .update_report_history(id, HistoryUpdate::status(Status::Pending))
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Core(srt_core::Error::InvalidTransition {
      from: Status::Processing,
      to:   Status::Pending,
    })
  ));

  s.update_report_history(id, HistoryUpdate::failed("boom"))
    .await
    .unwrap();
  let err = s
    .update_report_history(id, HistoryUpdate::completed("late"))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(srt_core::Error::InvalidTransition { .. })));

  // a rejected update leaves the row untouched
  let h = s.get_report_history(id).await.unwrap().unwrap();
  assert_eq!(h.status, Status::Failed);
  assert_eq!(h.msg.as_deref(), Some("boom"));

  // non-status fields stay writable
  let h = s
    .update_report_history(id, HistoryUpdate::msg("annotated"))
    .await
    .unwrap();
  assert_eq!(h.status, Status::Failed);
  assert_eq!(h.msg.as_deref(), Some("annotated"));
}

#[tokio::test]
async fn updating_missing_history_errors() {
  let s = store().await;
  let id = Uuid::new_v4();
  let err = s
    .update_delivery_history(id, HistoryUpdate::msg("x"))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::HistoryNotFound(missing) if missing == id));
}

#[tokio::test]
async fn delivery_history_lifecycle_and_listing() {
  let s = store().await;
  let daily = report(&s, "daily").await;
  let target = s.add_target(s3_target("archive")).await.unwrap();
  let d1 = s
    .add_delivery(NewDelivery::new(daily.report_id, target.target_id))
    .await
    .unwrap();
  let d2 = s
    .add_delivery(NewDelivery::new(daily.report_id, target.target_id))
    .await
    .unwrap();
  let run = s
    .add_report_history(NewReportHistory {
      report_id: daily.report_id,
      params:    "{}".into(),
      task_id:   None,
    })
    .await
    .unwrap();

  let a = s
    .add_delivery_history(run.report_history_id, d1.delivery_id)
    .await
    .unwrap();
  s.add_delivery_history(run.report_history_id, d2.delivery_id)
    .await
    .unwrap();
  assert_eq!(a.status, Status::Pending);
  assert_eq!(a.task_id, None);

  let a = s
    .update_delivery_history(a.delivery_history_id, HistoryUpdate::task_id("t-9"))
    .await
    .unwrap();
  assert_eq!(a.task_id.as_deref(), Some("t-9"));
  assert_eq!(a.status, Status::Pending);

  s.update_delivery_history(a.delivery_history_id, HistoryUpdate::status(Status::Processing))
    .await
    .unwrap();
  let a = s
    .update_delivery_history(
      a.delivery_history_id,
      HistoryUpdate::completed("delivered").with_artifact_url("https://bucket1.s3.amazonaws.com/reports/a.csv"),
    )
    .await
    .unwrap();
  assert_eq!(a.status, Status::Completed);
  assert_eq!(a.url.as_deref(), Some("https://bucket1.s3.amazonaws.com/reports/a.csv"));

  assert_eq!(s.list_delivery_histories(Some(d1.delivery_id)).await.unwrap().len(), 1);
  assert_eq!(s.list_delivery_histories(None).await.unwrap().len(), 2);
}

#[tokio::test]
async fn list_report_histories_filters_by_report() {
  let s = store().await;
  let a = report(&s, "a").await;
  let b = report(&s, "b").await;
  for r in [&a, &a, &b] {
    s.add_report_history(NewReportHistory {
      report_id: r.report_id,
      params:    "{}".into(),
      task_id:   None,
    })
    .await
    .unwrap();
  }
  assert_eq!(s.list_report_histories(Some(a.report_id)).await.unwrap().len(), 2);
  assert_eq!(s.list_report_histories(None).await.unwrap().len(), 3);
}
