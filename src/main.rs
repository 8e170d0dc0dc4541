//! burrow - A terminal directory browser with staged, undoable deletes.
//!
//! Usage:
//!   burrow [PATH]            Browse PATH (defaults to the current directory)
//!   burrow --hidden [PATH]   Start with hidden entries shown
//!   burrow --help            Show help

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use clap::Parser;
use color_eyre::eyre::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use burrow_core::BrowserConfig;

#[derive(Parser)]
#[command(
    name = "burrow",
    version,
    about = "A terminal directory browser",
    long_about = "burrow browses directories with vi-style keys.\n\n\
                  Deletes are staged in a private directory and can be undone \
                  until the program exits."
)]
struct Cli {
    /// Directory to open (defaults to current directory)
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Show hidden entries on startup
    #[arg(short = 'H', long)]
    hidden: bool,

    /// Config file (defaults to the platform config directory)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write logs to this file; filter with BURROW_LOG
    #[arg(long, value_name = "FILE", env = "BURROW_LOG_FILE")]
    log_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let _guard = match &cli.log_file {
        Some(file) => Some(init_logging(file)?),
        None => None,
    };

    let mut config =
        BrowserConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if cli.hidden {
        config.show_hidden = true;
    }
    tracing::debug!(?config, "configuration loaded");

    burrow_tui::run(config, &cli.path)
}

/// Log to `file`. The terminal belongs to the browser, so there is no
/// stderr layer.
fn init_logging(file: &Path) -> Result<WorkerGuard> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(file)
        .with_context(|| format!("Cannot open log file {}", file.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(file);

    let filter = EnvFilter::try_from_env("BURROW_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Ok(guard)
}
