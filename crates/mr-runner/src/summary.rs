//! Run results reported back to the operator

use std::time::Duration;

/// A statement the database rejected; the run continued past it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedStatement {
    /// Group the script belongs to
    pub group: String,

    /// Script file name
    pub file: String,

    /// Statement text as sent to the database
    pub statement: String,

    /// Database error message
    pub error: String,
}

/// How a group's processing ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupOutcome {
    /// Every pending file was processed and recorded
    Done,
    /// Processing stopped at `file`; later files were not attempted
    Halted {
        /// File that could not be read or recorded
        file: String,
        /// What went wrong
        reason: String,
    },
}

/// Result of running one group
#[derive(Debug, Clone)]
pub struct GroupReport {
    /// Group name
    pub group: String,

    /// Checkpoint at the start of the run
    pub checkpoint_before: Option<String>,

    /// Files selected for this run
    pub pending: Vec<String>,

    /// Files processed and recorded in the checkpoint store
    pub applied: Vec<String>,

    /// Statements that succeeded
    pub statements_executed: usize,

    /// Statements that failed and were skipped
    pub skipped: Vec<SkippedStatement>,

    /// How processing ended
    pub outcome: GroupOutcome,

    /// Time spent on the group
    pub duration: Duration,
}

impl GroupReport {
    pub(crate) fn new(
        group: &str,
        checkpoint_before: Option<String>,
        pending: Vec<String>,
    ) -> Self {
        Self {
            group: group.to_string(),
            checkpoint_before,
            pending,
            applied: Vec::new(),
            statements_executed: 0,
            skipped: Vec::new(),
            outcome: GroupOutcome::Done,
            duration: Duration::ZERO,
        }
    }

    /// Whether the group stopped before finishing its pending files
    pub fn is_halted(&self) -> bool {
        matches!(self.outcome, GroupOutcome::Halted { .. })
    }
}

/// Result of a whole run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Per-group results, in processing order
    pub groups: Vec<GroupReport>,

    /// Total execution time
    pub duration: Duration,
}

impl RunSummary {
    /// Number of files processed across all groups
    pub fn files_applied(&self) -> usize {
        self.groups.iter().map(|g| g.applied.len()).sum()
    }

    /// Number of statements that succeeded across all groups
    pub fn statements_executed(&self) -> usize {
        self.groups.iter().map(|g| g.statements_executed).sum()
    }

    /// Every skipped statement, in execution order
    pub fn skipped(&self) -> impl Iterator<Item = &SkippedStatement> {
        self.groups.iter().flat_map(|g| g.skipped.iter())
    }

    /// Number of skipped statements across all groups
    pub fn skipped_count(&self) -> usize {
        self.groups.iter().map(|g| g.skipped.len()).sum()
    }

    /// Groups that stopped early
    pub fn halted_groups(&self) -> impl Iterator<Item = &GroupReport> {
        self.groups.iter().filter(|g| g.is_halted())
    }

    /// True when no group halted. Skipped statements do not count.
    pub fn completed(&self) -> bool {
        self.halted_groups().next().is_none()
    }
}
