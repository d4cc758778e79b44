//! Shared plumbing for the `create-tables` and `etl` binaries.
//!
//! Both binaries read `dwh.cfg` from the working directory unless told
//! otherwise, open one warehouse connection, run their statements in order
//! and exit non-zero on the first failure.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::Args;
use sparkify_core::{config::Config, pipeline::RunReport};
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

/// Flags common to both binaries.
#[derive(Args, Debug)]
pub struct Target {
  /// Path to the INI configuration file.
  #[arg(short, long, value_name = "FILE", default_value = sparkify_core::config::DEFAULT_PATH)]
  pub config: PathBuf,

  /// Run against a local SQLite warehouse file instead of the cluster.
  #[arg(long, value_name = "FILE")]
  pub sqlite: Option<PathBuf>,
}

// ─── Setup ────────────────────────────────────────────────────────────────────

/// Install the fmt subscriber; `RUST_LOG` overrides the `info` default.
pub fn init_tracing() {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();
}

pub fn load_config(path: &Path) -> anyhow::Result<Config> {
  Config::load(path).with_context(|| format!("failed to read config file {}", path.display()))
}

/// Log one line per executed step.
pub fn log_report(report: &RunReport) {
  for (label, rows) in &report.steps {
    info!(step = %label, rows, "done");
  }
}
