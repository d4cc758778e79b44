//! The three pipeline stages: schema manager, loader and transformer.
//!
//! Each stage issues its statements one at a time against a [`Warehouse`] and
//! stops at the first failure. Statements already committed stay committed.

use tracing::{debug, info};

use crate::{
  config::Config,
  copy::copy_jobs,
  sql::{Statement, create_statements, drop_statements, insert_statements},
  table::Table,
  warehouse::Warehouse,
};

/// Rows affected by each step, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
  pub steps: Vec<(String, u64)>,
}

impl RunReport {
  fn record(&mut self, label: String, rows: u64) {
    self.steps.push((label, rows));
  }

  pub fn labels(&self) -> impl Iterator<Item = &str> {
    self.steps.iter().map(|(l, _)| l.as_str())
  }

  /// Rows reported by the step with this label.
  pub fn rows(&self, label: &str) -> Option<u64> {
    self.steps.iter().find(|(l, _)| l == label).map(|(_, n)| *n)
  }
}

/// Options for [`run_etl`].
#[derive(Debug, Clone, Copy, Default)]
pub struct EtlOptions {
  /// Transform whatever is already staged without copying new files.
  pub skip_load: bool,
}

async fn run_statements<W: Warehouse>(
  wh:         &W,
  statements: &[Statement],
  report:     &mut RunReport,
) -> Result<(), W::Error> {
  for statement in statements {
    info!(step = %statement.label, "running");
    debug!(sql = %statement.sql);
    let rows = wh.execute(statement).await?;
    report.record(statement.label.clone(), rows);
  }
  Ok(())
}

// ── Schema manager ────────────────────────────────────────────────────────

/// Drop every table if present, fact table first.
pub async fn drop_tables<W: Warehouse>(wh: &W, report: &mut RunReport) -> Result<(), W::Error> {
  run_statements(wh, &drop_statements(), report).await
}

/// Create every table, dimensions before the fact table.
pub async fn create_tables<W: Warehouse>(wh: &W, report: &mut RunReport) -> Result<(), W::Error> {
  run_statements(wh, &create_statements(wh.dialect()), report).await
}

/// Drop and recreate the whole schema.
pub async fn reset_schema<W: Warehouse>(wh: &W) -> Result<RunReport, W::Error> {
  let mut report = RunReport::default();
  drop_tables(wh, &mut report).await?;
  create_tables(wh, &mut report).await?;
  info!(tables = Table::CREATE_ORDER.len(), "schema created");
  Ok(report)
}

// ── Loader ────────────────────────────────────────────────────────────────

/// Copy both datasets into their staging tables, one commit per copy.
pub async fn load_staging_tables<W: Warehouse>(
  wh:     &W,
  config: &Config,
  report: &mut RunReport,
) -> Result<(), W::Error> {
  for job in copy_jobs(config) {
    info!(step = %job.label(), source = %job.source, "copying");
    let rows = wh.copy(&job).await?;
    report.record(job.label(), rows);
  }
  Ok(())
}

// ── Transformer ───────────────────────────────────────────────────────────

/// Populate the dimension tables, then the fact table, from staging.
pub async fn insert_tables<W: Warehouse>(wh: &W, report: &mut RunReport) -> Result<(), W::Error> {
  run_statements(wh, &insert_statements(wh.dialect()), report).await
}

/// Load staging (unless skipped) and transform.
pub async fn run_etl<W: Warehouse>(
  wh:      &W,
  config:  &Config,
  options: EtlOptions,
) -> Result<RunReport, W::Error> {
  let mut report = RunReport::default();
  if options.skip_load {
    info!("skipping staging load");
  } else {
    load_staging_tables(wh, config, &mut report).await?;
  }
  insert_tables(wh, &mut report).await?;
  Ok(report)
}
