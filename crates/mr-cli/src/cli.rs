//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Migrun - apply ordered SQL migration scripts and remember where each
/// group stopped.
///
/// Checkpoints advance once per file, so a script interrupted halfway is
/// replayed in full on the next run. Write scripts to be idempotent
/// (`CREATE TABLE IF NOT EXISTS`, `INSERT ... ON CONFLICT DO NOTHING`).
#[derive(Parser, Debug)]
#[command(name = "migrun")]
#[command(author, version, about, long_about)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to project directory
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: String,

    /// Override config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Override the database path from the config file
    #[arg(long, global = true, env = "MIGRUN_DATABASE")]
    pub database: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply pending migration scripts
    Run(RunArgs),

    /// Show each group's checkpoint and pending scripts
    Status(StatusArgs),

    /// Create migrun.yml and the default group folders
    Init(InitArgs),
}

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Groups to run (comma-separated, default: all, in config order)
    #[arg(short, long)]
    pub group: Option<String>,

    /// List the scripts that would run without executing them
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Groups to show (comma-separated, default: all)
    #[arg(short, long)]
    pub group: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: StatusOutput,
}

/// Status output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusOutput {
    /// Table format
    Table,
    /// JSON output
    Json,
}

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Project name (default: the project directory's name)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Overwrite an existing migrun.yml
    #[arg(long)]
    pub force: bool,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
