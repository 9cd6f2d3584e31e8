//! Report backoffice server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered with
//! `SRT_*` environment variables, opens the SQLite store, starts the job
//! worker and any report schedules, and serves the admin API over HTTP.
//!
//! # Secrets
//!
//! `--hash-password` prints the argon2 PHC string for `auth_password_hash`;
//! `--generate-key` prints a fresh base64 `secret_key`:
//!
//! ```text
//! cargo run -p srt-server --bin server -- --hash-password
//! cargo run -p srt-server --bin server -- --generate-key
//! ```

use std::{
  io::{BufRead as _, Write as _},
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use srt_dispatch::{Launcher, Worker, queue};
use srt_server::{ServerConfig, auth::AuthConfig, schedule};
use srt_store_sqlite::{SecretKey, SqliteStore};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Report generation and delivery backoffice")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,

  /// Print a fresh base64 key for `secret_key` and exit.
  #[arg(long)]
  generate_key: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  if cli.hash_password {
    let hash = srt_server::auth::hash_password(&prompt_password()?)?;
    println!("{hash}");
    return Ok(());
  }
  if cli.generate_key {
    println!("{}", SecretKey::generate().to_base64());
    return Ok(());
  }

  let cfg = load_config(cli.config)?;
  serve(cfg).await
}

/// Layer the config file under `SRT_*` variables; `SRT_STORAGE__BUCKET`
/// sets `storage.bucket`.
fn load_config(path: PathBuf) -> anyhow::Result<ServerConfig> {
  config::Config::builder()
    .add_source(config::File::from(path).required(false))
    .add_source(
      config::Environment::with_prefix("SRT")
        .prefix_separator("_")
        .separator("__"),
    )
    .build()
    .context("failed to read configuration")?
    .try_deserialize()
    .context("invalid configuration")
}

async fn serve(cfg: ServerConfig) -> anyhow::Result<()> {
  let key = SecretKey::from_base64(&cfg.secret_key).context("invalid secret_key")?;
  let store_path = expand_home(&cfg.store_path);
  let store = SqliteStore::open(&store_path, &key)
    .await
    .with_context(|| format!("failed to open store at {}", store_path.display()))?;

  let (queue, receiver) = queue::channel();
  let runner = Arc::new(queue);
  let launcher = Arc::new(Launcher::new(Arc::new(store), Arc::clone(&runner)));

  let storage = cfg.storage.storage(&cfg.worker);
  let worker = Arc::new(Worker::new(launcher.as_ref().clone(), storage));
  tokio::spawn(receiver.serve(worker, cfg.worker.concurrency));
  let _tickers = schedule::spawn_all(Arc::clone(&runner), &cfg.schedules);

  let auth_config = Arc::new(AuthConfig {
    username:      cfg.auth_username.clone(),
    password_hash: cfg.auth_password_hash.clone(),
  });
  let app = srt_server::router(launcher, auth_config);

  let address = format!("{}:{}", cfg.host, cfg.port);
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;
  tracing::info!(%address, provider = ?cfg.storage.provider, "serving admin API");

  axum::serve(listener, app).await.context("server error")
}

/// Read one line from stdin as the password.
fn prompt_password() -> anyhow::Result<String> {
  print!("Password: ");
  std::io::stdout().flush()?;
  let line = std::io::stdin()
    .lock()
    .lines()
    .next()
    .transpose()?
    .unwrap_or_default();
  Ok(line.trim_end_matches('\r').to_owned())
}

/// Resolve a leading `~/` against `$HOME`.
fn expand_home(path: &Path) -> PathBuf {
  match (path.strip_prefix("~"), std::env::var_os("HOME")) {
    (Ok(rest), Some(home)) => PathBuf::from(home).join(rest),
    _ => path.to_path_buf(),
  }
}
