//! tender server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) layered with
//! `TENDER_*` environment variables, opens the JSON record store, and serves
//! the question API over HTTP.
//!
//! The Anthropic API key may be given as `anthropic.api_key` in the config or
//! through `ANTHROPIC_API_KEY`.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::Parser;
use tender_anthropic::AnthropicClient;
use tender_api::{AppState, ServerConfig};
use tender_store_json::JsonStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Tender document question server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
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
    .add_source(
      config::Environment::with_prefix("TENDER")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true),
    )
    .build()
    .context("failed to read config file")?;

  let mut server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  anyhow::ensure!(server_cfg.max_files > 0, "max_files must be at least 1");

  server_cfg.store_path = expand_tilde(&server_cfg.store_path);
  server_cfg.upload_dir = expand_tilde(&server_cfg.upload_dir);
  if server_cfg.anthropic.api_key.is_empty()
    && let Ok(key) = std::env::var("ANTHROPIC_API_KEY")
  {
    server_cfg.anthropic.api_key = key;
  }

  // Open the record store.
  let store = JsonStore::open(&server_cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", server_cfg.store_path))?
    .with_max_files(server_cfg.max_files);

  tokio::fs::create_dir_all(&server_cfg.upload_dir)
    .await
    .with_context(|| format!("failed to create upload dir {:?}", server_cfg.upload_dir))?;

  let documents = AnthropicClient::new(server_cfg.anthropic.clone())
    .context("failed to initialise Anthropic client")?;

  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  let app = tender_api::router(AppState::new(store, documents, server_cfg));

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
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
