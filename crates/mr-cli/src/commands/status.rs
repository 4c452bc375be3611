//! Status command implementation

use anyhow::{Context, Result};
use mr_runner::{EngineOptions, MigrationEngine};
use serde::Serialize;
use std::sync::Arc;

use crate::cli::{GlobalArgs, StatusArgs, StatusOutput};
use crate::commands::common::checkpoint_label;
use crate::context::MigrationContext;

/// One group's position as reported by `migrun status`
#[derive(Debug, Serialize)]
struct GroupStatus {
    group: String,
    folder: String,
    checkpoint: Option<String>,
    pending: Vec<String>,
}

/// Execute the status command
pub(crate) fn execute(args: &StatusArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = MigrationContext::connect(global)?;
    let groups = ctx.select_groups(args.group.as_deref())?;
    let engine = MigrationEngine::new(
        Arc::clone(&ctx.db),
        ctx.read_only_checkpoint_store(),
        EngineOptions::from_config(&ctx.config),
    );

    let plans = engine.plan(&groups).context("Failed to read group status")?;
    drop(engine);
    ctx.close()?;

    let statuses: Vec<GroupStatus> = groups
        .iter()
        .zip(plans)
        .map(|(group, plan)| GroupStatus {
            group: plan.group,
            folder: group.folder().display().to_string(),
            checkpoint: plan.checkpoint,
            pending: plan.pending,
        })
        .collect();

    match args.output {
        StatusOutput::Table => print_table(&statuses),
        StatusOutput::Json => print_json(&statuses)?,
    }
    Ok(())
}

fn print_table(statuses: &[GroupStatus]) {
    let group_width = statuses
        .iter()
        .map(|s| s.group.len())
        .max()
        .unwrap_or(5)
        .max(5);
    let checkpoint_width = statuses
        .iter()
        .map(|s| checkpoint_label(s.checkpoint.as_deref()).len())
        .max()
        .unwrap_or(10)
        .max(10);

    println!(
        "{:<group_width$}  {:<checkpoint_width$}  PENDING",
        "GROUP", "CHECKPOINT"
    );
    println!(
        "{:-<group_width$}  {:-<checkpoint_width$}  {}",
        "",
        "",
        "-".repeat(7)
    );

    for status in statuses {
        println!(
            "{:<group_width$}  {:<checkpoint_width$}  {}",
            status.group,
            checkpoint_label(status.checkpoint.as_deref()),
            status.pending.len()
        );
    }

    for status in statuses.iter().filter(|s| !s.pending.is_empty()) {
        println!();
        println!("Pending in {}:", status.group);
        for file in &status.pending {
            println!("  {file}");
        }
    }
}

fn print_json(statuses: &[GroupStatus]) -> Result<()> {
    let json = serde_json::to_string_pretty(statuses).context("Failed to serialize to JSON")?;
    println!("{json}");
    Ok(())
}
