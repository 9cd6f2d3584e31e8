//! HTTP server and process wiring for the report backoffice.
//!
//! Serves the admin API under `/api/v1` behind staff Basic auth, plus an
//! unauthenticated `/health` probe.

pub mod auth;
pub mod error;
pub mod schedule;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{Json, Router, middleware, routing::get};
use serde::Deserialize;
use serde_json::{Value, json};
use srt_api::AppState;
use srt_core::{store::BackofficeStore, task::JobRunner};
use srt_dispatch::Storage;
use srt_objstore::{Connector, Credentials, MemoryConnector, S3Connector};
use tower_http::trace::TraceLayer;

use auth::AuthConfig;
use schedule::ScheduleConfig;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and `SRT_*`
/// environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:               String,
  #[serde(default = "default_port")]
  pub port:               u16,
  pub store_path:         PathBuf,
  /// Base64 XChaCha20-Poly1305 key sealing target passwords at rest.
  pub secret_key:         String,
  pub auth_username:      String,
  pub auth_password_hash: String,
  #[serde(default)]
  pub worker:             WorkerConfig,
  #[serde(default)]
  pub storage:            StorageConfig,
  #[serde(default)]
  pub schedules:          Vec<ScheduleConfig>,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8000 }

#[derive(Deserialize, Clone)]
pub struct WorkerConfig {
  /// Tasks allowed in flight at once.
  #[serde(default = "default_concurrency")]
  pub concurrency: usize,
  /// Parent of per-task scratch directories; the system temp dir if unset.
  #[serde(default)]
  pub scratch_dir: Option<PathBuf>,
}

fn default_concurrency() -> usize { 4 }

impl Default for WorkerConfig {
  fn default() -> Self {
    Self { concurrency: default_concurrency(), scratch_dir: None }
  }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
  S3,
  /// Process-local buckets; artifacts are lost on restart.
  #[default]
  Memory,
}

/// System object storage account and the bucket report artifacts go to.
#[derive(Deserialize, Clone)]
pub struct StorageConfig {
  #[serde(default)]
  pub provider:   Provider,
  #[serde(default)]
  pub access_key: Option<String>,
  #[serde(default)]
  pub secret_key: Option<String>,
  #[serde(default = "default_region")]
  pub region:     String,
  #[serde(default)]
  pub endpoint:   Option<String>,
  #[serde(default = "default_bucket")]
  pub bucket:     String,
  /// Directory inside the bucket, one per deployment environment.
  #[serde(default = "default_env")]
  pub env:        String,
  #[serde(default)]
  pub url_host:   Option<String>,
}

fn default_region() -> String { "us-east-1".to_string() }

fn default_bucket() -> String { "reports".to_string() }

fn default_env() -> String { "dev".to_string() }

impl Default for StorageConfig {
  fn default() -> Self {
    Self {
      provider:   Provider::default(),
      access_key: None,
      secret_key: None,
      region:     default_region(),
      endpoint:   None,
      bucket:     default_bucket(),
      env:        default_env(),
      url_host:   None,
    }
  }
}

impl StorageConfig {
  pub fn connector(&self) -> Arc<dyn Connector> {
    match self.provider {
      Provider::S3 => Arc::new(S3Connector),
      Provider::Memory => Arc::new(MemoryConnector::new()),
    }
  }

  pub fn credentials(&self) -> Credentials {
    Credentials::new(self.access_key.clone(), self.secret_key.clone())
      .with_region(&self.region)
      .with_endpoint(self.endpoint.clone())
  }

  /// Build the [`Storage`] handle used by report jobs and transports.
  pub fn storage(&self, worker: &WorkerConfig) -> Storage {
    let mut storage = Storage::new(
      self.connector(),
      self.credentials(),
      &self.bucket,
      &self.env,
    );
    if let Some(host) = &self.url_host {
      storage = storage.with_url_host(host);
    }
    if let Some(dir) = &worker.scratch_dir {
      storage = storage.with_scratch_root(dir);
    }
    storage
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full HTTP router: `/health` plus the authenticated admin API.
pub fn router<S, R>(launcher: AppState<S, R>, auth_config: Arc<AuthConfig>) -> Router
where
  S: BackofficeStore + 'static,
  R: JobRunner + 'static,
{
  let api = srt_api::api_router(launcher)
    .layer(middleware::from_fn_with_state(auth_config, auth::require_staff));

  Router::new()
    .route("/health", get(health))
    .nest("/api/v1", api)
    .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<Value> { Json(json!({ "status": "ok" })) }
