//! Shared types for CLI commands

use std::fmt;

/// Structured exit code carried through `anyhow` to `main`.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so destructors run and the connection is closed.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) u8);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Control flow only; main never prints it.
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// Render an optional checkpoint for humans
pub(crate) fn checkpoint_label(checkpoint: Option<&str>) -> &str {
    checkpoint.unwrap_or("-")
}
