//! mr-sql - SQL script splitting for Migrun
//!
//! This crate turns the text of a migration script into the individual
//! statements the engine executes one at a time. Boundaries come from the
//! sqlparser tokenizer, so terminators inside literals, quoted identifiers
//! and comments are never mistaken for statement ends.

pub mod dialect;
pub mod error;
pub mod splitter;

pub use error::{SqlError, SqlResult};
pub use splitter::{split_statements, StatementSplitter, Statements};
