//! `etl`: copy the source datasets into staging, then populate the
//! dimension and fact tables.
//!
//! ```
//! etl                                        # cluster from ./dwh.cfg
//! etl --skip-load                            # transform what is already staged
//! etl --sqlite dwh.db --config local.cfg     # local files into SQLite
//! ```

use anyhow::Context as _;
use clap::Parser;
use sparkify_cli::{Target, init_tracing, load_config, log_report};
use sparkify_core::{
  config::Config,
  pipeline::{EtlOptions, run_etl},
  warehouse::Warehouse,
};
use sparkify_redshift::RedshiftWarehouse;
use sparkify_store_sqlite::SqliteWarehouse;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about = "Load staged JSON and transform it into the star schema")]
struct Cli {
  #[command(flatten)]
  target: Target,

  /// Skip the staging copy and only run the transform statements.
  #[arg(long)]
  skip_load: bool,
}

async fn run<W: Warehouse>(wh: &W, config: &Config, options: EtlOptions) -> anyhow::Result<()> {
  let report = run_etl(wh, config, options).await.context("etl run failed")?;
  log_report(&report);
  Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  init_tracing();
  let cli = Cli::parse();
  let options = EtlOptions { skip_load: cli.skip_load };
  let config = load_config(&cli.target.config)?;

  match &cli.target.sqlite {
    Some(path) => {
      let wh = SqliteWarehouse::open(path)
        .await
        .with_context(|| format!("failed to open warehouse at {}", path.display()))?;
      run(&wh, &config, options).await?;
      wh.close().await?;
    }
    None => {
      let wh = RedshiftWarehouse::connect(&config.cluster)
        .await
        .context("failed to connect to cluster")?;
      run(&wh, &config, options).await?;
      wh.close().await?;
    }
  }

  info!("etl finished");
  Ok(())
}
