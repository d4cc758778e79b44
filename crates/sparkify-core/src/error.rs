//! Error types for `sparkify-core`.

use thiserror::Error;

use crate::table::Table;

#[derive(Debug, Error)]
pub enum Error {
  #[error("configuration error: {0}")]
  Config(#[from] config::ConfigError),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("invalid JSONPaths expression: {0:?}")]
  InvalidJsonPath(String),

  #[error("manifest for {table} has {found} paths, table has {expected} columns")]
  ManifestColumns {
    table:    Table,
    expected: usize,
    found:    usize,
  },

  #[error("source record is not a JSON object")]
  NotAnObject,

  /// A JSON value that cannot be stored in the column's type.
  #[error("cannot load {value} into column {column}")]
  Coerce {
    column: &'static str,
    value:  String,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
