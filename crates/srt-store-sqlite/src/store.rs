//! [`SqliteStore`], the SQLite implementation of [`BackofficeStore`].

use std::{path::Path, sync::Arc};

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use srt_core::{
  delivery::{Delivery, NewDelivery},
  history::{DeliveryHistory, HistoryUpdate, NewReportHistory, ReportHistory},
  report::{NewReport, Report},
  status::Status,
  store::BackofficeStore,
  target::{NewTarget, Target},
};

use crate::{
  Error, Result,
  crypto::{SecretKey, Sealer},
  encode::{
    DELIVERY_COLUMNS, DELIVERY_HISTORY_COLUMNS, RawDelivery, RawDeliveryHistory,
    RawReport, RawReportHistory, RawTarget, REPORT_COLUMNS, REPORT_HISTORY_COLUMNS,
    TARGET_COLUMNS, decode_status, encode_dt, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A backoffice store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn:   tokio_rusqlite::Connection,
  sealer: Arc<Sealer>,
}

/// The two history tables share a shape; only names differ.
#[derive(Debug, Clone, Copy)]
enum HistoryTable {
  Report,
  Delivery,
}

impl HistoryTable {
  fn table(self) -> &'static str {
    match self {
      Self::Report => "report_histories",
      Self::Delivery => "delivery_histories",
    }
  }

  fn id_column(self) -> &'static str {
    match self {
      Self::Report => "report_history_id",
      Self::Delivery => "delivery_history_id",
    }
  }

  fn url_column(self) -> &'static str {
    match self {
      Self::Report => "path",
      Self::Delivery => "url",
    }
  }
}

enum UpdateOutcome {
  Applied,
  Missing,
  /// `to` is not a forward transition from the stored status `current`,
  /// carried here undecoded.
  Rejected { current: String, to: Status },
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  /// Target passwords are sealed under `key`.
  pub async fn open(path: impl AsRef<Path>, key: &SecretKey) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn, key).await
  }

  /// Open an in-memory store with a throwaway key; useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn, &SecretKey::generate()).await
  }

  async fn init(conn: tokio_rusqlite::Connection, key: &SecretKey) -> Result<Self> {
    let store = Self { conn, sealer: Arc::new(Sealer::new(key)) };
    store
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(store)
  }

  async fn delete_row(&self, table: &'static str, column: &'static str, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);
    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          &format!("DELETE FROM {table} WHERE {column} = ?1"),
          rusqlite::params![id_str],
        )?)
      })
      .await?;
    Ok(n > 0)
  }

  /// Apply `update` to a history row after validating its status change.
  async fn update_history(&self, kind: HistoryTable, id: Uuid, update: HistoryUpdate) -> Result<()> {
    let id_str = encode_uuid(id);
    let now_str = encode_dt(Utc::now());
    let next = update.status;
    let status_str = next.map(|s| s.to_string());

    let outcome = self
      .conn
      .call(move |conn| {
        let (table, id_col, url_col) = (kind.table(), kind.id_column(), kind.url_column());
        let tx = conn.transaction()?;

        let current: Option<String> = tx
          .query_row(
            &format!("SELECT status FROM {table} WHERE {id_col} = ?1"),
            rusqlite::params![id_str],
            |r| r.get(0),
          )
          .optional()?;
        let Some(current) = current else {
          return Ok(UpdateOutcome::Missing);
        };

        if let Some(next) = next {
          let allowed = current
            .parse::<Status>()
            .is_ok_and(|from| from.can_transition_to(next));
          if !allowed {
            return Ok(UpdateOutcome::Rejected { current, to: next });
          }
        }

        tx.execute(
          &format!(
            "UPDATE {table} SET
               status      = COALESCE(?1, status),
               msg         = COALESCE(?2, msg),
               {url_col}   = COALESCE(?3, {url_col}),
               task_id     = COALESCE(?4, task_id),
               modified_at = ?5
             WHERE {id_col} = ?6"
          ),
          rusqlite::params![
            status_str,
            update.msg,
            update.artifact_url,
            update.task_id,
            now_str,
            id_str,
          ],
        )?;
        tx.commit()?;
        Ok(UpdateOutcome::Applied)
      })
      .await?;

    match outcome {
      UpdateOutcome::Applied => Ok(()),
      UpdateOutcome::Missing => Err(Error::HistoryNotFound(id)),
      UpdateOutcome::Rejected { current, to } => {
        let from = decode_status(&current)?;
        Err(srt_core::Error::InvalidTransition { from, to }.into())
      }
    }
  }
}

// ─── BackofficeStore impl ────────────────────────────────────────────────────

impl BackofficeStore for SqliteStore {
  type Error = Error;

  // ── Targets ───────────────────────────────────────────────────────────────

  async fn add_target(&self, input: NewTarget) -> Result<Target> {
    let now = Utc::now();
    let target = Target {
      target_id:          Uuid::new_v4(),
      name:               input.name,
      kind:               input.kind,
      host:               input.host,
      username:           input.username,
      password:           input.password,
      path:               input.path,
      emails:             input.emails,
      include_attachment: input.include_attachment,
      notes:              input.notes,
      created_at:         now,
      modified_at:        now,
    };

    let id_str       = encode_uuid(target.target_id);
    let name         = target.name.clone();
    let kind_str     = target.kind.to_string();
    let host         = target.host.clone();
    let username     = target.username.clone();
    let sealed       = target.password.as_deref().map(|p| self.sealer.seal(p)).transpose()?;
    let path         = target.path.clone();
    let emails       = target.emails.clone();
    let attach       = target.include_attachment;
    let notes        = target.notes.clone();
    let at_str       = encode_dt(now);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT INTO targets ({TARGET_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)"
          ),
          rusqlite::params![
            id_str, name, kind_str, host, username, sealed, path, emails, attach,
            notes, at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    tracing::debug!(target_id = %target.target_id, kind = %target.kind, "added target");
    Ok(target)
  }

  async fn get_target(&self, id: Uuid) -> Result<Option<Target>> {
    let id_str = encode_uuid(id);
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {TARGET_COLUMNS} FROM targets WHERE target_id = ?1"),
              rusqlite::params![id_str],
              RawTarget::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(|r| r.into_target(&self.sealer)).transpose()
  }

  async fn list_targets(&self) -> Result<Vec<Target>> {
    let raws = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {TARGET_COLUMNS} FROM targets ORDER BY name, created_at"
        ))?;
        let rows = stmt
          .query_map([], RawTarget::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(|r| r.into_target(&self.sealer)).collect()
  }

  async fn delete_target(&self, id: Uuid) -> Result<bool> {
    self.delete_row("targets", "target_id", id).await
  }

  // ── Deliveries ────────────────────────────────────────────────────────────

  async fn add_delivery(&self, input: NewDelivery) -> Result<Delivery> {
    let now = Utc::now();
    let delivery = Delivery {
      delivery_id: Uuid::new_v4(),
      target_id:   input.target_id,
      report_id:   input.report_id,
      path:        input.path,
      is_active:   input.is_active,
      notes:       input.notes,
      created_at:  now,
      modified_at: now,
    };

    let id_str     = encode_uuid(delivery.delivery_id);
    let target_str = delivery.target_id.map(encode_uuid);
    let report_str = delivery.report_id.map(encode_uuid);
    let path       = delivery.path.clone();
    let active     = delivery.is_active;
    let notes      = delivery.notes.clone();
    let at_str     = encode_dt(now);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT INTO deliveries ({DELIVERY_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)"
          ),
          rusqlite::params![id_str, target_str, report_str, path, active, notes, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(delivery)
  }

  async fn get_delivery(&self, id: Uuid) -> Result<Option<Delivery>> {
    let id_str = encode_uuid(id);
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {DELIVERY_COLUMNS} FROM deliveries WHERE delivery_id = ?1"),
              rusqlite::params![id_str],
              RawDelivery::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawDelivery::into_delivery).transpose()
  }

  async fn list_deliveries(&self, report_id: Option<Uuid>) -> Result<Vec<Delivery>> {
    let report_str = report_id.map(encode_uuid);
    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {DELIVERY_COLUMNS} FROM deliveries
           WHERE (?1 IS NULL OR report_id = ?1)
           ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![report_str], RawDelivery::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawDelivery::into_delivery).collect()
  }

  async fn active_deliveries(&self, report_id: Uuid) -> Result<Vec<Delivery>> {
    let report_str = encode_uuid(report_id);
    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {DELIVERY_COLUMNS} FROM deliveries
           WHERE report_id = ?1 AND is_active = 1"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![report_str], RawDelivery::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawDelivery::into_delivery).collect()
  }

  async fn set_delivery_active(&self, id: Uuid, is_active: bool) -> Result<Option<Delivery>> {
    let id_str = encode_uuid(id);
    let now_str = encode_dt(Utc::now());
    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE deliveries SET is_active = ?1, modified_at = ?2 WHERE delivery_id = ?3",
          rusqlite::params![is_active, now_str, id_str],
        )?)
      })
      .await?;
    if n == 0 {
      return Ok(None);
    }
    self.get_delivery(id).await
  }

  // ── Reports ───────────────────────────────────────────────────────────────

  async fn add_report(&self, input: NewReport) -> Result<Report> {
    let now = Utc::now();
    let report = Report {
      report_id:   Uuid::new_v4(),
      uid:         input.uid,
      name:        input.name,
      description: input.description,
      params:      input.params,
      created_at:  now,
      modified_at: now,
    };

    let id_str      = encode_uuid(report.report_id);
    let uid_str     = report.uid.to_string();
    let name        = report.name.clone();
    let description = report.description.clone();
    let params_str  = serde_json::to_string(&report.params)?;
    let at_str      = encode_dt(now);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT INTO reports ({REPORT_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)"
          ),
          rusqlite::params![id_str, uid_str, name, description, params_str, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(report)
  }

  async fn get_report(&self, id: Uuid) -> Result<Option<Report>> {
    let id_str = encode_uuid(id);
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {REPORT_COLUMNS} FROM reports WHERE report_id = ?1"),
              rusqlite::params![id_str],
              RawReport::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawReport::into_report).transpose()
  }

  async fn list_reports(&self, search: Option<String>) -> Result<Vec<Report>> {
    let needle = search.filter(|s| !s.trim().is_empty());
    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {REPORT_COLUMNS} FROM reports
           WHERE ?1 IS NULL
              OR instr(lower(name), lower(?1)) > 0
              OR instr(lower(coalesce(description, '')), lower(?1)) > 0
           ORDER BY name, created_at"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![needle], RawReport::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawReport::into_report).collect()
  }

  async fn delete_report(&self, id: Uuid) -> Result<bool> {
    self.delete_row("reports", "report_id", id).await
  }

  // ── Report histories ──────────────────────────────────────────────────────

  async fn add_report_history(&self, input: NewReportHistory) -> Result<ReportHistory> {
    let now = Utc::now();
    let history = ReportHistory {
      report_history_id: Uuid::new_v4(),
      report_id:         input.report_id,
      status:            Status::Pending,
      path:              None,
      params:            input.params,
      msg:               None,
      task_id:           input.task_id,
      created_at:        now,
      modified_at:       now,
    };

    let id_str     = encode_uuid(history.report_history_id);
    let report_str = encode_uuid(history.report_id);
    let status_str = history.status.to_string();
    let params     = history.params.clone();
    let task_id    = history.task_id.clone();
    let at_str     = encode_dt(now);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT INTO report_histories ({REPORT_HISTORY_COLUMNS})
             VALUES (?1, ?2, ?3, NULL, ?4, NULL, ?5, ?6, ?6)"
          ),
          rusqlite::params![id_str, report_str, status_str, params, task_id, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(history)
  }

  async fn get_report_history(&self, id: Uuid) -> Result<Option<ReportHistory>> {
    let id_str = encode_uuid(id);
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {REPORT_HISTORY_COLUMNS} FROM report_histories
                 WHERE report_history_id = ?1"
              ),
              rusqlite::params![id_str],
              RawReportHistory::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawReportHistory::into_history).transpose()
  }

  async fn list_report_histories(&self, report_id: Option<Uuid>) -> Result<Vec<ReportHistory>> {
    let report_str = report_id.map(encode_uuid);
    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {REPORT_HISTORY_COLUMNS} FROM report_histories
           WHERE (?1 IS NULL OR report_id = ?1)
           ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![report_str], RawReportHistory::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawReportHistory::into_history).collect()
  }

  async fn update_report_history(&self, id: Uuid, update: HistoryUpdate) -> Result<ReportHistory> {
    self.update_history(HistoryTable::Report, id, update).await?;
    self
      .get_report_history(id)
      .await?
      .ok_or(Error::HistoryNotFound(id))
  }

  // ── Delivery histories ────────────────────────────────────────────────────

  async fn add_delivery_history(
    &self,
    report_history_id: Uuid,
    delivery_id: Uuid,
  ) -> Result<DeliveryHistory> {
    let now = Utc::now();
    let history = DeliveryHistory {
      delivery_history_id: Uuid::new_v4(),
      report_history_id:   Some(report_history_id),
      delivery_id:         Some(delivery_id),
      status:              Status::Pending,
      url:                 None,
      msg:                 None,
      task_id:             None,
      created_at:          now,
      modified_at:         now,
    };

    let id_str       = encode_uuid(history.delivery_history_id);
    let rh_str       = encode_uuid(report_history_id);
    let delivery_str = encode_uuid(delivery_id);
    let status_str   = history.status.to_string();
    let at_str       = encode_dt(now);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT INTO delivery_histories ({DELIVERY_HISTORY_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, NULL, NULL, NULL, ?5, ?5)"
          ),
          rusqlite::params![id_str, rh_str, delivery_str, status_str, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(history)
  }

  async fn get_delivery_history(&self, id: Uuid) -> Result<Option<DeliveryHistory>> {
    let id_str = encode_uuid(id);
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {DELIVERY_HISTORY_COLUMNS} FROM delivery_histories
                 WHERE delivery_history_id = ?1"
              ),
              rusqlite::params![id_str],
              RawDeliveryHistory::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawDeliveryHistory::into_history).transpose()
  }

  async fn list_delivery_histories(&self, delivery_id: Option<Uuid>) -> Result<Vec<DeliveryHistory>> {
    let delivery_str = delivery_id.map(encode_uuid);
    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {DELIVERY_HISTORY_COLUMNS} FROM delivery_histories
           WHERE (?1 IS NULL OR delivery_id = ?1)
           ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![delivery_str], RawDeliveryHistory::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawDeliveryHistory::into_history).collect()
  }

  async fn update_delivery_history(
    &self,
    id: Uuid,
    update: HistoryUpdate,
  ) -> Result<DeliveryHistory> {
    self.update_history(HistoryTable::Delivery, id, update).await?;
    self
      .get_delivery_history(id)
      .await?
      .ok_or(Error::HistoryNotFound(id))
  }
}
