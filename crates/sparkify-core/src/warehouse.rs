//! The `Warehouse` trait: the connection the pipeline runs against.
//!
//! Implemented by backends (`sparkify-redshift`, `sparkify-store-sqlite`).
//! The pipeline steps in [`crate::pipeline`] depend only on this trait.

use std::future::Future;

use crate::{copy::CopyJob, sql::Dialect, sql::Statement, table::Table};

/// A single open connection to a warehouse.
///
/// Every call completes and commits before it returns; callers issue the next
/// statement only after the previous one resolved.
pub trait Warehouse: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// The SQL flavour statements must be rendered in.
  fn dialect(&self) -> Dialect;

  /// Run one statement and commit. Returns the number of rows affected, or
  /// zero for DDL.
  fn execute<'a>(
    &'a self,
    statement: &'a Statement,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  /// Bulk-copy a storage location into a staging table and commit. Returns
  /// the number of rows loaded when the engine reports it.
  fn copy<'a>(
    &'a self,
    job: &'a CopyJob,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  /// Number of rows currently in `table`.
  fn row_count(&self, table: Table) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;
}
