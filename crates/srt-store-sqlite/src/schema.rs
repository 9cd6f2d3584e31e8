//! SQL schema for the backoffice SQLite store.
//!
//! Executed once at connection startup; the schema version is recorded in
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS targets (
    target_id          TEXT PRIMARY KEY,
    name               TEXT NOT NULL,
    kind               TEXT NOT NULL,   -- 's3' | 'ftp' | 'sftp' | 'email'
    host               TEXT,
    username           TEXT,
    password           TEXT,            -- base64(nonce || ciphertext)
    path               TEXT,
    emails             TEXT,            -- comma-delimited
    include_attachment INTEGER NOT NULL DEFAULT 0,
    notes              TEXT NOT NULL DEFAULT '',
    created_at         TEXT NOT NULL,
    modified_at        TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS reports (
    report_id   TEXT PRIMARY KEY,
    uid         TEXT NOT NULL,          -- selects the report engine
    name        TEXT NOT NULL,
    description TEXT,
    params      TEXT NOT NULL DEFAULT '{}',
    created_at  TEXT NOT NULL,
    modified_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS deliveries (
    delivery_id TEXT PRIMARY KEY,
    target_id   TEXT REFERENCES targets(target_id) ON DELETE SET NULL,
    report_id   TEXT REFERENCES reports(report_id) ON DELETE SET NULL,
    path        TEXT,
    is_active   INTEGER NOT NULL DEFAULT 1,
    notes       TEXT NOT NULL DEFAULT '',
    created_at  TEXT NOT NULL,
    modified_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS report_histories (
    report_history_id TEXT PRIMARY KEY,
    report_id         TEXT NOT NULL REFERENCES reports(report_id) ON DELETE CASCADE,
    status            TEXT NOT NULL DEFAULT 'pending',
    path              TEXT,             -- public URL of the artifact
    params            TEXT NOT NULL,
    msg               TEXT,
    task_id           TEXT,
    created_at        TEXT NOT NULL,
    modified_at       TEXT NOT NULL
);

-- Delivery attempts are never deleted; their links are cleared instead.
CREATE TABLE IF NOT EXISTS delivery_histories (
    delivery_history_id TEXT PRIMARY KEY,
    report_history_id   TEXT REFERENCES report_histories(report_history_id) ON DELETE SET NULL,
    delivery_id         TEXT REFERENCES deliveries(delivery_id) ON DELETE SET NULL,
    status              TEXT NOT NULL DEFAULT 'pending',
    url                 TEXT,
    msg                 TEXT,
    task_id             TEXT,
    created_at          TEXT NOT NULL,
    modified_at         TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS deliveries_report_idx         ON deliveries(report_id);
CREATE INDEX IF NOT EXISTS report_histories_report_idx   ON report_histories(report_id);
CREATE INDEX IF NOT EXISTS delivery_histories_delivery_idx ON delivery_histories(delivery_id);

PRAGMA user_version = 1;
";
