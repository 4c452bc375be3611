//! mr-db - Database gateway for Migrun
//!
//! This crate provides the `Database` trait the engine executes statements
//! through, its DuckDB implementation, and the checkpoint store that keeps
//! group progress in a single-row table of the target database.

pub mod checkpoint_table;
pub mod duckdb;
pub mod error;
pub mod sql_utils;
pub mod traits;

pub use checkpoint_table::TableCheckpointStore;
pub use duckdb::DuckDbBackend;
pub use error::{DbError, DbResult};
pub use traits::Database;
