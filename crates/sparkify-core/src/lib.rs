//! Core types for the sparkify warehouse loader.
//!
//! Table definitions, SQL rendering, copy jobs, configuration and the three
//! pipeline stages. This crate holds no database driver; backends implement
//! [`warehouse::Warehouse`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod config;
pub mod copy;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod sql;
pub mod table;
pub mod warehouse;

pub use error::{Error, Result};
