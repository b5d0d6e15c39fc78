mod config;
mod relay;

use std::io;
use std::path::PathBuf;

use achievelog_engine::{EventAdapter, Ledger, LogBroadcaster};
use achievelog_storage::CompletionStore;
use anyhow::{Context, Result};
use clap::Parser;

use crate::config::{Backend, RelayConfig, DEFAULT_CONFIG_PATH};

/// Record achievement completions read as JSON lines on stdin.
#[derive(Debug, Parser)]
#[command(name = "achievelog-relay", version)]
struct Args {
    /// YAML config with a `database` section.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Use an SQLite file instead of the configured MySQL server.
    #[arg(long)]
    sqlite: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let backend = match args.sqlite {
        Some(path) if !args.config.exists() => Backend::Sqlite(path),
        sqlite => RelayConfig::load(&args.config)?.backend(sqlite)?,
    };

    match backend {
        Backend::MySql(config) => {
            let ledger = Ledger::connect(&config)
                .with_context(|| format!("opening ledger at {config}"))?;
            serve(ledger)
        }
        Backend::Sqlite(path) => {
            let ledger = Ledger::open_sqlite(&path)
                .with_context(|| format!("opening ledger at {}", path.display()))?;
            serve(ledger)
        }
    }
}

fn serve<S: CompletionStore>(ledger: Ledger<S>) -> Result<()> {
    tracing::info!("achievelog relay started");
    let mut adapter = EventAdapter::new(ledger, LogBroadcaster);
    let summary = relay::pump(&adapter, io::stdin().lock());
    adapter.shutdown();

    let summary = summary?;
    tracing::info!(
        recorded = summary.recorded,
        duplicates = summary.duplicates,
        failed = summary.failed,
        rejected = summary.rejected,
        "input closed, relay stopped"
    );
    Ok(())
}
