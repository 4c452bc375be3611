//! mr-core - Core library for Migrun
//!
//! This crate provides configuration parsing, migration group definitions,
//! pending-script selection, and the checkpoint store abstraction shared by
//! the execution engine and the CLI.

pub mod checkpoint;
pub mod config;
pub mod error;
pub mod group;
pub mod script;
pub mod selector;

pub use checkpoint::{CheckpointStore, FileCheckpointStore, MemoryCheckpointStore};
pub use config::{CheckpointBackend, Config, DbType, Dialect, MissingCheckpointPolicy};
pub use error::{CoreError, CoreResult};
pub use group::MigrationGroup;
pub use script::ScriptFile;
pub use selector::select_pending;
