//! [`RedshiftWarehouse`], the Redshift implementation of [`Warehouse`].

use postgres_native_tls::MakeTlsConnector;
use sparkify_core::{
  config::ClusterConfig,
  copy::CopyJob,
  sql::{Dialect, Statement},
  table::Table,
  warehouse::Warehouse,
};
use tokio::task::JoinHandle;
use tokio_postgres::{Client, NoTls, SimpleQueryMessage, config::SslMode};
use tracing::{error, info};

use crate::{Error, Result};

const APPLICATION_NAME: &str = "sparkify";

/// Driver configuration for `cluster`.
pub fn pg_config(cluster: &ClusterConfig) -> tokio_postgres::Config {
  let mut pg = tokio_postgres::Config::new();
  pg.host(&cluster.host)
    .port(cluster.db_port)
    .dbname(&cluster.db_name)
    .user(&cluster.db_user)
    .password(&cluster.db_password)
    .application_name(APPLICATION_NAME)
    .ssl_mode(if cluster.ssl { SslMode::Require } else { SslMode::Disable });
  pg
}

/// Rows affected according to the last `CommandComplete` in a response.
fn rows_affected(messages: &[SimpleQueryMessage]) -> u64 {
  messages
    .iter()
    .rev()
    .find_map(|m| match m {
      SimpleQueryMessage::CommandComplete(n) => Some(*n),
      _ => None,
    })
    .unwrap_or(0)
}

// ─── Warehouse ───────────────────────────────────────────────────────────────

/// An open connection to a Redshift cluster.
pub struct RedshiftWarehouse {
  client:     Client,
  connection: JoinHandle<()>,
}

impl RedshiftWarehouse {
  /// Connect to the cluster described by `cluster`.
  pub async fn connect(cluster: &ClusterConfig) -> Result<Self> {
    info!(
      host = %cluster.host,
      port = cluster.db_port,
      db_name = %cluster.db_name,
      db_user = %cluster.db_user,
      "connecting to cluster"
    );
    let pg = pg_config(cluster);

    let (client, connection) = if cluster.ssl {
      let tls = MakeTlsConnector::new(native_tls::TlsConnector::builder().build()?);
      let (client, connection) = pg.connect(tls).await?;
      let handle = tokio::spawn(async move {
        if let Err(e) = connection.await {
          error!("cluster connection error: {e}");
        }
      });
      (client, handle)
    } else {
      let (client, connection) = pg.connect(NoTls).await?;
      let handle = tokio::spawn(async move {
        if let Err(e) = connection.await {
          error!("cluster connection error: {e}");
        }
      });
      (client, handle)
    };

    info!("connected");
    Ok(Self { client, connection })
  }

  /// Close the connection and wait for the connection task to finish.
  pub async fn close(self) -> Result<()> {
    drop(self.client);
    self.connection.await?;
    info!("connection closed");
    Ok(())
  }
}

// ─── Warehouse impl ──────────────────────────────────────────────────────────

impl Warehouse for RedshiftWarehouse {
  type Error = Error;

  fn dialect(&self) -> Dialect {
    Dialect::Redshift
  }

  async fn execute(&self, statement: &Statement) -> Result<u64> {
    let messages = self.client.simple_query(&statement.sql).await?;
    Ok(rows_affected(&messages))
  }

  async fn copy(&self, job: &CopyJob) -> Result<u64> {
    self.execute(&job.to_redshift()).await
  }

  async fn row_count(&self, table: Table) -> Result<u64> {
    let messages = self
      .client
      .simple_query(&format!("SELECT COUNT(*) FROM {table}"))
      .await?;

    let value = messages.iter().find_map(|m| match m {
      SimpleQueryMessage::Row(row) => row.get(0).map(str::to_owned),
      _ => None,
    });
    value
      .as_deref()
      .and_then(|v| v.parse().ok())
      .ok_or_else(|| Error::UnexpectedResponse(format!("COUNT(*) on {table} returned {value:?}")))
  }
}
