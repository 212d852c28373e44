//! hadir-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens the
//! deployment's SQLite store, and serves the Hadir API over HTTP.
//!
//! # Administrator bootstrap
//!
//! The administrator account is created explicitly, once per deployment:
//!
//! ```sh
//! cargo run -p hadir-server -- --provision-admin
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use hadir_core::auth::{Provisioned, provision_admin};
use hadir_server::{AppState, ServerConfig, auth::LocalIdentityProvider};
use hadir_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Hadir attendance server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Create the administrator account with a password read from stdin, then
  /// exit. Does nothing if the account already exists.
  #[arg(long)]
  provision_admin: bool,
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

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("HADIR"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  let store = Arc::new(store);

  if cli.provision_admin {
    let password = read_password()?;
    anyhow::ensure!(!password.is_empty(), "administrator password must not be empty");
    let provider = LocalIdentityProvider::new(store.clone());
    let outcome = provision_admin(&provider, &server_cfg.directory(), &password)
      .await
      .context("failed to provision administrator")?;
    match outcome {
      Provisioned::Created => println!("administrator account created"),
      Provisioned::AlreadyPresent => println!("administrator account already exists; unchanged"),
    }
    return Ok(());
  }

  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  let state = AppState::new(store, server_cfg).context("invalid configuration")?;
  let app = hadir_server::router(state);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Read one line from stdin as the password.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Administrator password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_owned())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
