//! Omade Cravings CLI - log in, inspect the session and walk the site's
//! routes from the terminal.

mod commands;

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use omade_core::config::{Config, StorageKind};
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::Commands;

/// File name prefix for the rolling log
const LOG_FILE_PREFIX: &str = "omade.log";

#[derive(Parser)]
#[command(name = "omade")]
#[command(about = "Omade Cravings session client")]
#[command(version)]
struct Cli {
    /// API base URL (overrides config and OMADE_API_BASE_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Where the session is persisted
    #[arg(long, global = true)]
    storage: Option<StorageArg>,

    /// Also write logs to a daily-rolling file in this directory
    #[arg(long, global = true, env = "OMADE_LOG_DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StorageArg {
    File,
    Keyring,
    Memory,
}

impl From<StorageArg> for StorageKind {
    fn from(arg: StorageArg) -> Self {
        match arg {
            StorageArg::File => StorageKind::File,
            StorageArg::Keyring => StorageKind::Keyring,
            StorageArg::Memory => StorageKind::Memory,
        }
    }
}

/// Initialize the tracing subscriber for logging.
///
/// `RUST_LOG` controls the level (default `warn`). The returned guard must be
/// held until exit so buffered file output is flushed.
fn init_tracing(log_dir: Option<&PathBuf>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _log_guard = init_tracing(cli.log_dir.as_ref());
    info!("Omade CLI starting");

    let mut config = Config::load()?;
    if let Some(url) = cli.api_url {
        config.api_base_url = url;
    }
    if let Some(storage) = cli.storage {
        config.storage = storage.into();
    }

    if let Err(e) = cli.command.execute(config).await {
        error!("Command failed: {e:#}");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
