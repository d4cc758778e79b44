//! Error type for `sparkify-store-sqlite`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] sparkify_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("cannot read {path}: {source}")]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("cannot walk source directory: {0}")]
  Walk(#[from] walkdir::Error),

  /// Object-store URLs need a warehouse with a native bulk copy.
  #[error("source {0:?} is not a local path")]
  UnsupportedSource(String),

  #[error("no .json files under {0}")]
  NoSourceFiles(PathBuf),

  #[error("{path}, record {index}: {source}")]
  Record {
    path:   PathBuf,
    index:  usize,
    #[source]
    source: sparkify_core::Error,
  },

  #[error("source reader task failed: {0}")]
  Reader(#[from] tokio::task::JoinError),

  #[error("date/time parse error: {0}")]
  DateParse(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
