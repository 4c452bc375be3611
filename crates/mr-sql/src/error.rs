//! Error types for mr-sql

use thiserror::Error;

/// SQL splitting errors
#[derive(Error, Debug)]
pub enum SqlError {
    /// The tokenizer rejected the script (S001)
    #[error("[S001] SQL tokenize error: {0}")]
    Tokenize(String),
}

/// Result type alias for SqlError
pub type SqlResult<T> = Result<T, SqlError>;
