//! CodeBench tracker CLI
//!
//! Drives the engagement tracker from the command line.
//!
//! # Commands
//!
//! - `cb-tracker replay <events.jsonl>`: feed a recorded session of host
//!   events through the tracker and deliver the resulting logs to the
//!   collector (`--dry-run` keeps everything local)
//! - `cb-tracker logs`: the dashboard read path, logs stored for a student
//! - `cb-tracker export <events.jsonl>`: write the save/export documents
//! - `cb-tracker notebook register <path>`: create a notebook record
//! - `cb-tracker goal get|set`: the daily study goal
//! - `cb-tracker config show|validate`
//!
//! Configuration comes from `--config` (TOML or JSON) and `CB_TRACKER_*`
//! environment variables; `RUST_LOG` overrides the configured log level.

mod args;
mod commands;
mod console;
mod router;

use anyhow::Context;
use args::Cli;
use cb_tracker_core::config::{self, LoggingConfig};
use clap::Parser;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = config::load(cli.config.as_deref())
        .with_context(|| "failed to load tracker configuration")?;
    init_tracing(&config.logging)?;

    router::route(cli, config).await
}

fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let writer = match &logging.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            BoxMakeWriter::new(std::io::stderr.and(Mutex::new(file)))
        }
        None => BoxMakeWriter::new(std::io::stderr),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(logging.log_file.is_none());

    match logging.format.as_str() {
        "json" => builder.json().init(),
        "compact" => builder.compact().init(),
        _ => builder.pretty().init(),
    }
    Ok(())
}
