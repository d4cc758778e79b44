//! `create-tables`: drop and recreate the warehouse schema.
//!
//! ```
//! create-tables                      # cluster from ./dwh.cfg
//! create-tables --sqlite dwh.db      # local SQLite warehouse
//! ```

use anyhow::Context as _;
use clap::Parser;
use sparkify_cli::{Target, init_tracing, load_config, log_report};
use sparkify_core::{pipeline::reset_schema, warehouse::Warehouse};
use sparkify_redshift::RedshiftWarehouse;
use sparkify_store_sqlite::SqliteWarehouse;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about = "Drop and recreate the staging, dimension and fact tables")]
struct Cli {
  #[command(flatten)]
  target: Target,
}

async fn run<W: Warehouse>(wh: &W) -> anyhow::Result<()> {
  let report = reset_schema(wh).await.context("schema reset failed")?;
  log_report(&report);
  Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  init_tracing();
  let cli = Cli::parse();

  match &cli.target.sqlite {
    Some(path) => {
      let wh = SqliteWarehouse::open(path)
        .await
        .with_context(|| format!("failed to open warehouse at {}", path.display()))?;
      run(&wh).await?;
      wh.close().await?;
    }
    None => {
      let config = load_config(&cli.target.config)?;
      let wh = RedshiftWarehouse::connect(&config.cluster)
        .await
        .context("failed to connect to cluster")?;
      run(&wh).await?;
      wh.close().await?;
    }
  }

  info!("tables created");
  Ok(())
}
