//! Runtime context for CLI commands

use anyhow::{bail, Context, Result};
use mr_core::{
    CheckpointBackend, CheckpointStore, Config, FileCheckpointStore, MigrationGroup,
};
use mr_db::{Database, DuckDbBackend, TableCheckpointStore};
use std::path::Path;
use std::sync::Arc;

use crate::cli::GlobalArgs;

/// Loaded configuration plus the one connection a command works through
pub(crate) struct MigrationContext {
    /// Project configuration
    pub config: Config,

    /// Database connection, shared with the table checkpoint backend
    pub db: Arc<dyn Database>,
}

impl MigrationContext {
    /// Load the configuration and open the database
    pub fn connect(global: &GlobalArgs) -> Result<Self> {
        let config = load_config(global)?;
        let db_path = database_path(&config, global.database.as_deref())?;
        log::debug!("Connecting to duckdb database at {db_path}");

        let db: Arc<dyn Database> = Arc::new(
            DuckDbBackend::new(&db_path)
                .with_context(|| format!("Failed to connect to database: {db_path}"))?,
        );

        Ok(Self { config, db })
    }

    /// Build the configured checkpoint store
    pub fn checkpoint_store(&self) -> Result<Box<dyn CheckpointStore>> {
        match self.config.checkpoint.backend {
            CheckpointBackend::File => {
                let path = self.config.checkpoint_path();
                log::debug!("Using checkpoint file {}", path.display());
                Ok(Box::new(FileCheckpointStore::new(path)))
            }
            CheckpointBackend::Table => {
                let store =
                    TableCheckpointStore::new(Arc::clone(&self.db), &self.config.checkpoint.table);
                store
                    .prepare(&self.config.group_names())
                    .with_context(|| {
                        format!(
                            "Failed to prepare checkpoint table '{}'",
                            self.config.checkpoint.table
                        )
                    })?;
                Ok(Box::new(store))
            }
        }
    }

    /// Build the configured checkpoint store without changing the database.
    ///
    /// Used by `status` and dry runs: the checkpoint table is not created,
    /// and a group without a column reads as never run.
    pub fn read_only_checkpoint_store(&self) -> Box<dyn CheckpointStore> {
        match self.config.checkpoint.backend {
            CheckpointBackend::File => {
                Box::new(FileCheckpointStore::new(self.config.checkpoint_path()))
            }
            CheckpointBackend::Table => Box::new(TableCheckpointStore::read_only(
                Arc::clone(&self.db),
                &self.config.checkpoint.table,
            )),
        }
    }

    /// Resolve a comma-separated group filter, keeping config order
    pub fn select_groups(&self, filter: Option<&str>) -> Result<Vec<MigrationGroup>> {
        let groups = self.config.migration_groups();
        let Some(filter) = filter else {
            return Ok(groups);
        };

        let wanted: Vec<&str> = filter
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        for name in &wanted {
            if !groups.iter().any(|g| g.name() == *name) {
                bail!(
                    "Unknown group '{}'. Configured groups: {}",
                    name,
                    self.config.group_names().join(", ")
                );
            }
        }

        Ok(groups
            .into_iter()
            .filter(|g| wanted.contains(&g.name()))
            .collect())
    }

    /// Close the connection
    pub fn close(self) -> Result<()> {
        self.db.close().context("Failed to close database connection")
    }
}

/// Load config from the `--config` path or the project directory
pub(crate) fn load_config(global: &GlobalArgs) -> Result<Config> {
    match &global.config {
        Some(path) => Config::load(Path::new(path))
            .with_context(|| format!("Failed to load configuration file: {path}")),
        None => Config::load_from_dir(Path::new(&global.project_dir))
            .context("Failed to load project configuration"),
    }
}

/// Database location after the override, with the parent folder created
fn database_path(config: &Config, cli_override: Option<&str>) -> Result<String> {
    let raw = cli_override.unwrap_or(&config.database.path);
    if raw == ":memory:" {
        return Ok(raw.to_string());
    }

    let path = match cli_override {
        // Overrides are taken relative to the working directory.
        Some(path) => Path::new(path).to_path_buf(),
        None => config.resolve_path(raw),
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    Ok(path.to_string_lossy().into_owned())
}
