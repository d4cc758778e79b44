//! SQLite backend for the sparkify warehouse.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Bulk copies read JSON files from the
//! local filesystem instead of object storage.

mod encode;
mod load;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteWarehouse;

#[cfg(test)]
mod tests;
