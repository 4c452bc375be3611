//! Migration execution engine
//!
//! Groups run one after another in the order given. Within a group each
//! pending file is read, split, and executed statement by statement; a
//! rejected statement is logged and skipped. Once every statement of a file
//! has been attempted the file is recorded as the group's checkpoint, whether
//! or not some statements failed.

use crate::error::{RunError, RunResult};
use crate::summary::{GroupOutcome, GroupReport, RunSummary, SkippedStatement};
use mr_core::{
    select_pending, CheckpointStore, Config, Dialect, MigrationGroup, MissingCheckpointPolicy,
    ScriptFile,
};
use mr_db::Database;
use mr_sql::StatementSplitter;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// Settings the engine needs from the project configuration
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Script file extension, without the dot
    pub extension: String,

    /// Dialect used to split scripts
    pub dialect: Dialect,

    /// Behaviour when a checkpoint names a vanished file
    pub missing_checkpoint: MissingCheckpointPolicy,
}

impl EngineOptions {
    /// Take the engine settings from a loaded configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            extension: config.script_extension().to_string(),
            dialect: config.dialect,
            missing_checkpoint: config.missing_checkpoint,
        }
    }
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            extension: "sql".to_string(),
            dialect: Dialect::default(),
            missing_checkpoint: MissingCheckpointPolicy::default(),
        }
    }
}

/// Where a group is in its run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupState {
    /// Not started yet
    Pending,
    /// Reading the checkpoint and listing scripts
    Selecting,
    /// Executing the named file
    RunningFile(String),
    /// All pending files processed
    Done,
    /// Stopped early; the checkpoint was not advanced past the failing file
    Halted,
}

impl fmt::Display for GroupState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupState::Pending => write!(f, "pending"),
            GroupState::Selecting => write!(f, "selecting"),
            GroupState::RunningFile(file) => write!(f, "running {file}"),
            GroupState::Done => write!(f, "done"),
            GroupState::Halted => write!(f, "halted"),
        }
    }
}

/// What a run would do for one group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupPlan {
    /// Group name
    pub group: String,

    /// Current checkpoint
    pub checkpoint: Option<String>,

    /// Files that would be applied, in order
    pub pending: Vec<String>,
}

/// Runs migration groups against one database connection.
///
/// The engine owns the whole run context: the shared connection, the
/// checkpoint store, and the splitter. Nothing is global.
pub struct MigrationEngine {
    db: Arc<dyn Database>,
    checkpoints: Box<dyn CheckpointStore>,
    splitter: StatementSplitter,
    options: EngineOptions,
}

impl MigrationEngine {
    /// Create an engine over a connection and checkpoint store
    pub fn new(
        db: Arc<dyn Database>,
        checkpoints: Box<dyn CheckpointStore>,
        options: EngineOptions,
    ) -> Self {
        Self {
            db,
            checkpoints,
            splitter: StatementSplitter::new(options.dialect),
            options,
        }
    }

    #[cfg(test)]
    fn checkpoints(&self) -> &dyn CheckpointStore {
        self.checkpoints.as_ref()
    }

    /// Work out the pending files of each group without executing anything
    pub fn plan(&self, groups: &[MigrationGroup]) -> RunResult<Vec<GroupPlan>> {
        groups
            .iter()
            .map(|group| {
                let (checkpoint, pending) = self.select(group)?;
                Ok(GroupPlan {
                    group: group.name().to_string(),
                    checkpoint,
                    pending,
                })
            })
            .collect()
    }

    /// Apply every group in order.
    ///
    /// Errors abort the run: an unreadable checkpoint store, a selection
    /// failure, or a lost connection. Skipped statements and halted groups
    /// are reported in the returned summary instead.
    pub fn run(&mut self, groups: &[MigrationGroup]) -> RunResult<RunSummary> {
        let started = Instant::now();
        log::info!(
            "Running {} migration group(s) with {} checkpoints",
            groups.len(),
            self.checkpoints.backend_name()
        );

        let mut summary = RunSummary::default();
        for group in groups {
            summary.groups.push(self.run_group(group)?);
        }
        summary.duration = started.elapsed();
        Ok(summary)
    }

    /// Apply the pending files of a single group
    pub fn run_group(&mut self, group: &MigrationGroup) -> RunResult<GroupReport> {
        let started = Instant::now();
        let mut state = GroupState::Pending;

        transition(group, &mut state, GroupState::Selecting);
        let (checkpoint, pending) = self.select(group)?;

        if pending.is_empty() {
            log::info!("Group '{}' is up to date", group.name());
        } else {
            log::info!(
                "Group '{}': {} pending file(s) after {}",
                group.name(),
                pending.len(),
                checkpoint.as_deref().unwrap_or("<none>")
            );
        }

        let mut report = GroupReport::new(group.name(), checkpoint.clone(), pending.clone());
        let mut current = checkpoint;

        for file in &pending {
            transition(group, &mut state, GroupState::RunningFile(file.clone()));

            let script = match ScriptFile::load(group.folder(), file) {
                Ok(script) => script,
                Err(e) => {
                    log::error!("Group '{}' halted: {e}", group.name());
                    halt(group, &mut state, &mut report, file, e.to_string());
                    break;
                }
            };

            self.apply_script(group, &script, &mut report)?;

            if let Err(e) = self.record(group, current.as_deref(), file) {
                log::error!(
                    "{e}. The file ran but is not recorded; it will run again on the next \
                     invocation unless the checkpoint is updated manually. Halting group '{}'.",
                    group.name()
                );
                halt(group, &mut state, &mut report, file, e.to_string());
                break;
            }
            if current.as_deref().map_or(true, |c| file.as_str() > c) {
                current = Some(file.clone());
            }

            report.applied.push(file.clone());
            log::info!("Finished {}/{}", group.name(), file);
        }

        if state != GroupState::Halted {
            transition(group, &mut state, GroupState::Done);
        }
        report.duration = started.elapsed();
        Ok(report)
    }

    /// Read the group's checkpoint and list the files after it
    fn select(&self, group: &MigrationGroup) -> RunResult<(Option<String>, Vec<String>)> {
        let checkpoint = self
            .checkpoints
            .get(group.name())
            .map_err(|source| RunError::CheckpointRead {
                group: group.name().to_string(),
                source,
            })?;

        let pending = select_pending(
            group,
            &self.options.extension,
            checkpoint.as_deref(),
            self.options.missing_checkpoint,
        )
        .map_err(|source| RunError::Selection {
            group: group.name().to_string(),
            source,
        })?;

        Ok((checkpoint, pending))
    }

    /// Execute every statement of `script`, skipping the ones that fail
    fn apply_script(
        &self,
        group: &MigrationGroup,
        script: &ScriptFile,
        report: &mut GroupReport,
    ) -> RunResult<()> {
        if script.is_blank() {
            log::info!(
                "{}/{} is empty; marking it as applied",
                group.name(),
                script.name()
            );
            return Ok(());
        }

        for statement in self.splitter.split(script.content()) {
            match self.db.execute(&statement) {
                Ok(()) => report.statements_executed += 1,
                Err(e) if e.is_statement_error() => {
                    log::warn!(
                        "Skipping statement in {}/{}: {e}\n{statement}",
                        group.name(),
                        script.name()
                    );
                    report.skipped.push(SkippedStatement {
                        group: group.name().to_string(),
                        file: script.name().to_string(),
                        statement,
                        error: e.to_string(),
                    });
                }
                Err(source) => {
                    return Err(RunError::Connection {
                        group: group.name().to_string(),
                        file: script.name().to_string(),
                        source,
                    });
                }
            }
        }

        // Close any transaction the script opened and left dangling.
        match self.db.commit() {
            Ok(()) => Ok(()),
            Err(e) if e.is_statement_error() => {
                log::warn!(
                    "Commit after {}/{} failed: {e}",
                    group.name(),
                    script.name()
                );
                report.skipped.push(SkippedStatement {
                    group: group.name().to_string(),
                    file: script.name().to_string(),
                    statement: "COMMIT".to_string(),
                    error: e.to_string(),
                });
                // An aborted transaction must not leak into the next file.
                self.db.rollback().map_err(|source| RunError::Connection {
                    group: group.name().to_string(),
                    file: script.name().to_string(),
                    source,
                })
            }
            Err(source) => Err(RunError::Connection {
                group: group.name().to_string(),
                file: script.name().to_string(),
                source,
            }),
        }
    }

    /// Record `file` as processed unless that would move the checkpoint back
    fn record(
        &mut self,
        group: &MigrationGroup,
        current: Option<&str>,
        file: &str,
    ) -> mr_core::CoreResult<()> {
        if current.is_some_and(|c| file <= c) {
            log::debug!(
                "Keeping checkpoint '{}' for group '{}' (reprocessed {})",
                current.unwrap_or_default(),
                group.name(),
                file
            );
            return Ok(());
        }
        self.checkpoints.set(group.name(), file)
    }
}

fn transition(group: &MigrationGroup, state: &mut GroupState, next: GroupState) {
    log::debug!("Group '{}': {} -> {}", group.name(), state, next);
    *state = next;
}

fn halt(
    group: &MigrationGroup,
    state: &mut GroupState,
    report: &mut GroupReport,
    file: &str,
    reason: String,
) {
    transition(group, state, GroupState::Halted);
    report.outcome = GroupOutcome::Halted {
        file: file.to_string(),
        reason,
    };
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod tests;
