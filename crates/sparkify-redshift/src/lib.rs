//! Redshift backend for the sparkify warehouse.
//!
//! Talks to the cluster over the Postgres wire protocol with
//! [`tokio_postgres`]. Every statement is sent as a simple query outside any
//! transaction block, so the cluster commits it on completion.

mod warehouse;

pub mod error;

pub use error::{Error, Result};
pub use warehouse::{RedshiftWarehouse, pg_config};
