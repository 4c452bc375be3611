//! Migration groups
//!
//! A group is a named folder of scripts with its own checkpoint. Files in a
//! group are always applied in ascending lexical (byte-wise, case-sensitive)
//! order of their file names.

use std::fmt;
use std::path::{Path, PathBuf};

/// A named folder of migration scripts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationGroup {
    name: String,
    folder: PathBuf,
}

impl MigrationGroup {
    /// Create a group from its name and script folder
    pub fn new(name: impl Into<String>, folder: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            folder: folder.into(),
        }
    }

    /// Group identifier, also used as the checkpoint key
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Folder holding the group's scripts
    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// Whether `name` is usable as a group identifier.
    ///
    /// Names end up as column suffixes in the table checkpoint backend, so
    /// they are limited to ASCII alphanumerics and `_`.
    pub fn is_valid_name(name: &str) -> bool {
        !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    }
}

impl fmt::Display for MigrationGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
