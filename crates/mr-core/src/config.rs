//! Configuration types and parsing for migrun.yml

use crate::error::{CoreError, CoreResult};
use crate::group::MigrationGroup;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// File names searched for by [`Config::load_from_dir`], in order.
pub const CONFIG_FILE_NAMES: &[&str] = &["migrun.yml", "migrun.yaml"];

/// Main project configuration from migrun.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Project name
    pub name: String,

    /// SQL dialect used to split scripts into statements
    #[serde(default)]
    pub dialect: Dialect,

    /// Extension (without the dot) that marks a file as a migration script
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Database connection configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Migration groups, processed in the order listed
    #[serde(default = "default_groups")]
    pub groups: Vec<GroupConfig>,

    /// Where group checkpoints are persisted
    #[serde(default)]
    pub checkpoint: CheckpointConfig,

    /// What to do when a recorded checkpoint no longer exists on disk
    #[serde(default)]
    pub missing_checkpoint: MissingCheckpointPolicy,

    /// Directory relative paths are resolved against. Set by the loader.
    #[serde(skip)]
    pub root: PathBuf,
}

/// Database type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DbType {
    /// DuckDB (default)
    #[default]
    DuckDb,
}

impl std::fmt::Display for DbType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DbType::DuckDb => write!(f, "duckdb"),
        }
    }
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Database type
    #[serde(rename = "type", default)]
    pub db_type: DbType,

    /// Database path (file-based or :memory:)
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            db_type: DbType::default(),
            path: default_db_path(),
        }
    }
}

/// A migration group entry: a name and the folder holding its scripts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupConfig {
    /// Group identifier, also the checkpoint key
    pub name: String,

    /// Folder containing the group's scripts
    pub path: String,
}

/// Checkpoint persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckpointConfig {
    /// Which backend stores checkpoints
    #[serde(default)]
    pub backend: CheckpointBackend,

    /// State file used by the `file` backend
    #[serde(default = "default_checkpoint_path")]
    pub path: String,

    /// Table used by the `table` backend
    #[serde(default = "default_checkpoint_table")]
    pub table: String,
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            backend: CheckpointBackend::default(),
            path: default_checkpoint_path(),
            table: default_checkpoint_table(),
        }
    }
}

/// Checkpoint storage medium
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CheckpointBackend {
    /// Local YAML state file (default)
    #[default]
    File,
    /// Single-row table in the target database
    Table,
}

impl std::fmt::Display for CheckpointBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckpointBackend::File => write!(f, "file"),
            CheckpointBackend::Table => write!(f, "table"),
        }
    }
}

/// Behaviour when a group's checkpoint names a file that is no longer present
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MissingCheckpointPolicy {
    /// Stop the run and ask the operator to repair the checkpoint (default)
    #[default]
    Fail,
    /// Keep selecting names strictly greater than the checkpoint
    Resume,
    /// Ignore the checkpoint and reprocess every file in the group
    Reprocess,
}

/// SQL dialect for statement splitting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Dialect-neutral tokenizing
    Generic,
    /// DuckDB SQL dialect
    #[default]
    DuckDb,
    /// PostgreSQL
    Postgres,
    /// MySQL
    MySql,
    /// SQLite
    Sqlite,
    /// Snowflake
    Snowflake,
    /// Microsoft SQL Server
    MsSql,
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Dialect::Generic => "generic",
            Dialect::DuckDb => "duckdb",
            Dialect::Postgres => "postgres",
            Dialect::MySql => "mysql",
            Dialect::Sqlite => "sqlite",
            Dialect::Snowflake => "snowflake",
            Dialect::MsSql => "mssql",
        };
        f.write_str(name)
    }
}

fn default_extension() -> String {
    "sql".to_string()
}

const DEFAULT_DB_PATH: &str = ":memory:";

fn default_db_path() -> String {
    DEFAULT_DB_PATH.to_string()
}

fn default_checkpoint_path() -> String {
    ".migrun/checkpoints.yml".to_string()
}

fn default_checkpoint_table() -> String {
    "migrun_checkpoint".to_string()
}

/// The two groups every project starts with: `init` runs before `additions`.
fn default_groups() -> Vec<GroupConfig> {
    vec![
        GroupConfig {
            name: "init".to_string(),
            path: "db/init".to_string(),
        },
        GroupConfig {
            name: "additions".to_string(),
            path: "db/additions".to_string(),
        },
    ]
}

impl Config {
    /// Build a configuration with every default filled in.
    ///
    /// Used by `migrun init` to scaffold a new project.
    pub fn with_defaults(name: &str) -> Self {
        Self {
            name: name.to_string(),
            dialect: Dialect::default(),
            extension: default_extension(),
            database: DatabaseConfig {
                db_type: DbType::DuckDb,
                path: "target/dev.duckdb".to_string(),
            },
            groups: default_groups(),
            checkpoint: CheckpointConfig::default(),
            missing_checkpoint: MissingCheckpointPolicy::default(),
            root: PathBuf::new(),
        }
    }

    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let mut config: Config =
            serde_yaml::from_str(&content).map_err(|e| CoreError::ConfigParseError {
                message: format!("{}: {}", path.display(), e),
            })?;
        config.root = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a project directory
    /// Looks for migrun.yml or migrun.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        for name in CONFIG_FILE_NAMES {
            let candidate = dir.join(name);
            if candidate.exists() {
                return Self::load(&candidate);
            }
        }
        Err(CoreError::ConfigNotFound {
            path: dir.join(CONFIG_FILE_NAMES[0]).display().to_string(),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> CoreResult<()> {
        if self.name.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "Project name cannot be empty".to_string(),
            });
        }

        if self.groups.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "At least one migration group must be configured".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for group in &self.groups {
            if !MigrationGroup::is_valid_name(&group.name) {
                return Err(CoreError::ConfigInvalid {
                    message: format!(
                        "Invalid group name '{}': use ASCII letters, digits and '_' only",
                        group.name
                    ),
                });
            }
            if !seen.insert(group.name.as_str()) {
                return Err(CoreError::ConfigInvalid {
                    message: format!("Duplicate group name '{}'", group.name),
                });
            }
            if group.path.trim().is_empty() {
                return Err(CoreError::ConfigInvalid {
                    message: format!("Group '{}' has an empty path", group.name),
                });
            }
        }

        let extension = self.extension.trim_start_matches('.');
        if extension.is_empty() || extension.contains(['/', '\\']) {
            return Err(CoreError::ConfigInvalid {
                message: format!("Invalid script extension '{}'", self.extension),
            });
        }

        if self.checkpoint.backend == CheckpointBackend::File
            && self.checkpoint.path.trim().is_empty()
        {
            return Err(CoreError::ConfigInvalid {
                message: "checkpoint.path cannot be empty for the file backend".to_string(),
            });
        }
        if self.checkpoint.backend == CheckpointBackend::Table
            && self.checkpoint.table.trim().is_empty()
        {
            return Err(CoreError::ConfigInvalid {
                message: "checkpoint.table cannot be empty for the table backend".to_string(),
            });
        }

        Ok(())
    }

    /// Script extension without a leading dot
    pub fn script_extension(&self) -> &str {
        self.extension.trim_start_matches('.')
    }

    /// Resolve a configured path against the project root
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Absolute location of the checkpoint state file
    pub fn checkpoint_path(&self) -> PathBuf {
        self.resolve_path(&self.checkpoint.path)
    }

    /// Configured groups with their folders resolved, in processing order
    pub fn migration_groups(&self) -> Vec<MigrationGroup> {
        self.groups
            .iter()
            .map(|g| MigrationGroup::new(&g.name, self.resolve_path(&g.path)))
            .collect()
    }

    /// Group names in processing order
    pub fn group_names(&self) -> Vec<&str> {
        self.groups.iter().map(|g| g.name.as_str()).collect()
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
