//! Error type for `sparkify-redshift`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Postgres(#[from] tokio_postgres::Error),

  #[error("tls error: {0}")]
  Tls(#[from] native_tls::Error),

  #[error("connection task failed: {0}")]
  Join(#[from] tokio::task::JoinError),

  /// The server answered a query in a shape the caller did not expect.
  #[error("unexpected response: {0}")]
  UnexpectedResponse(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
