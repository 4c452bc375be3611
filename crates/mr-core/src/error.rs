//! Error types for mr-core

use thiserror::Error;

/// Core error type for Migrun
#[derive(Error, Debug)]
pub enum CoreError {
    /// C001: Configuration file not found
    #[error("[C001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// C002: Failed to parse configuration file
    #[error("[C002] Failed to parse config: {message}")]
    ConfigParseError { message: String },

    /// C003: Invalid configuration value
    #[error("[C003] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// C004: Script folder for a group does not exist
    #[error("[C004] Script folder for group '{group}' not found: {path}")]
    GroupFolderNotFound { group: String, path: String },

    /// C005: Recorded checkpoint no longer matches a file on disk
    #[error("[C005] Checkpoint for group '{group}' refers to '{file}', which is no longer in {path}. Restore the file or fix the checkpoint manually")]
    CheckpointFileMissing {
        group: String,
        file: String,
        path: String,
    },

    /// C006: Checkpoint store could not be read
    #[error("[C006] Failed to read checkpoint for group '{group}': {message}")]
    CheckpointRead { group: String, message: String },

    /// C007: Checkpoint store could not be written
    #[error("[C007] Failed to record checkpoint '{file}' for group '{group}': {message}")]
    CheckpointWrite {
        group: String,
        file: String,
        message: String,
    },

    /// C008: Script file could not be read
    #[error("[C008] Failed to read script '{path}': {source}")]
    ScriptRead {
        path: String,
        source: std::io::Error,
    },

    /// C009: IO error
    #[error("[C009] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// C010: IO error with file path context
    #[error("[C010] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// C011: YAML parse error
    #[error("[C011] YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
