//! Checkpoint persistence
//!
//! A checkpoint is the name of the last script a group has processed. The
//! engine only talks to [`CheckpointStore`]; the medium is chosen by
//! configuration. This module holds the file-backed and in-memory stores,
//! the database table store lives in `mr-db`.

use crate::error::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

/// Per-group "last processed file" storage.
///
/// A successful `set` must be visible to the next `get` in the same process.
/// A failed `set` is always reported: an unrecorded file will be applied
/// again on the next run.
pub trait CheckpointStore {
    /// Last processed file for `group`, or `None` if the group never ran
    fn get(&self, group: &str) -> CoreResult<Option<String>>;

    /// Record `file_name` as the last processed file for `group`
    fn set(&mut self, group: &str, file_name: &str) -> CoreResult<()>;

    /// Backend identifier for logging
    fn backend_name(&self) -> &'static str;
}

/// One group's entry in the checkpoint state file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointEntry {
    /// Last processed script
    pub last_file: String,

    /// When the entry was written
    pub updated_at: DateTime<Utc>,
}

/// Checkpoints kept in a YAML file keyed by group name.
///
/// Every `set` re-reads the whole file, updates one key and rewrites it, so
/// only one process may use a given file at a time.
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    path: PathBuf,
}

impl FileCheckpointStore {
    /// Create a store backed by `path`. The file is created on first `set`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the state file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every entry in the state file. A missing file is an empty map.
    pub fn load_all(&self) -> CoreResult<BTreeMap<String, CheckpointEntry>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&self.path).map_err(|e| CoreError::IoWithPath {
            path: self.path.display().to_string(),
            source: e,
        })?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Write the full map using write-to-temp-then-rename
    fn save_all(&self, entries: &BTreeMap<String, CheckpointEntry>) -> CoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let temp_path = self.path.with_extension("yml.tmp");
        let yaml = serde_yaml::to_string(entries)?;
        fs::write(&temp_path, yaml)?;
        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}

impl CheckpointStore for FileCheckpointStore {
    fn get(&self, group: &str) -> CoreResult<Option<String>> {
        let entries = self.load_all().map_err(|e| CoreError::CheckpointRead {
            group: group.to_string(),
            message: e.to_string(),
        })?;
        Ok(entries.get(group).map(|entry| entry.last_file.clone()))
    }

    fn set(&mut self, group: &str, file_name: &str) -> CoreResult<()> {
        let write_error = |e: CoreError| CoreError::CheckpointWrite {
            group: group.to_string(),
            file: file_name.to_string(),
            message: e.to_string(),
        };

        let mut entries = self.load_all().map_err(write_error)?;
        entries.insert(
            group.to_string(),
            CheckpointEntry {
                last_file: file_name.to_string(),
                updated_at: Utc::now(),
            },
        );
        self.save_all(&entries).map_err(write_error)
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}

/// Process-local checkpoints, lost on exit
#[derive(Debug, Clone, Default)]
pub struct MemoryCheckpointStore {
    entries: HashMap<String, String>,
}

impl MemoryCheckpointStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with `(group, file)` pairs
    pub fn with_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(group, file)| (group.to_string(), file.to_string()))
                .collect(),
        }
    }
}

impl CheckpointStore for MemoryCheckpointStore {
    fn get(&self, group: &str) -> CoreResult<Option<String>> {
        Ok(self.entries.get(group).cloned())
    }

    fn set(&mut self, group: &str, file_name: &str) -> CoreResult<()> {
        self.entries.insert(group.to_string(), file_name.to_string());
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
#[path = "checkpoint_test.rs"]
mod tests;
