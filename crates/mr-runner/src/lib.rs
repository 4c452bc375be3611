//! mr-runner - Migration execution engine for Migrun
//!
//! Applies each configured group's pending scripts in order, one statement at
//! a time, and advances the group's checkpoint after every file.
//!
//! Checkpoints are per file, so a crash in the middle of a script replays the
//! whole script on the next run. Scripts should be written to be idempotent
//! (`CREATE TABLE IF NOT EXISTS`, `INSERT ... ON CONFLICT DO NOTHING`).

pub mod engine;
pub mod error;
pub mod summary;

pub use engine::{EngineOptions, GroupPlan, GroupState, MigrationEngine};
pub use error::{RunError, RunResult};
pub use summary::{GroupOutcome, GroupReport, RunSummary, SkippedStatement};
