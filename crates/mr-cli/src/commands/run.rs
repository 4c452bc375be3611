//! Run command implementation

use anyhow::{Context, Result};
use mr_runner::{EngineOptions, GroupOutcome, GroupPlan, MigrationEngine, RunSummary};
use std::sync::Arc;

use crate::cli::{GlobalArgs, RunArgs};
use crate::commands::common::{checkpoint_label, ExitCode};
use crate::context::MigrationContext;

/// Execute the run command
pub(crate) fn execute(args: &RunArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = MigrationContext::connect(global)?;
    let groups = ctx.select_groups(args.group.as_deref())?;
    let options = EngineOptions::from_config(&ctx.config);

    if args.dry_run {
        let engine =
            MigrationEngine::new(Arc::clone(&ctx.db), ctx.read_only_checkpoint_store(), options);
        let plans = engine.plan(&groups).context("Failed to plan migration run")?;
        print_plan(&plans);
        drop(engine);
        return ctx.close();
    }

    let store = ctx.checkpoint_store()?;
    let mut engine = MigrationEngine::new(Arc::clone(&ctx.db), store, options);
    let summary = engine.run(&groups).context("Migration run aborted")?;
    drop(engine);
    ctx.close()?;

    print_summary(&summary);

    if !summary.completed() {
        return Err(ExitCode(1).into());
    }
    Ok(())
}

fn print_plan(plans: &[GroupPlan]) {
    for plan in plans {
        println!(
            "{} (checkpoint: {})",
            plan.group,
            checkpoint_label(plan.checkpoint.as_deref())
        );
        if plan.pending.is_empty() {
            println!("  up to date");
        }
        for file in &plan.pending {
            println!("  would run {file}");
        }
    }
}

fn print_summary(summary: &RunSummary) {
    println!();
    for report in &summary.groups {
        let outcome = match &report.outcome {
            GroupOutcome::Done => "done".to_string(),
            GroupOutcome::Halted { file, reason } => format!("HALTED at {file}: {reason}"),
        };
        println!(
            "{:<12} {} file(s), {} statement(s), {} skipped  [{}]",
            report.group,
            report.applied.len(),
            report.statements_executed,
            report.skipped.len(),
            outcome
        );
    }

    if summary.skipped_count() > 0 {
        println!();
        println!("Skipped statements:");
        for skipped in summary.skipped() {
            println!("  {}/{}: {}", skipped.group, skipped.file, skipped.error);
            for line in skipped.statement.lines() {
                println!("    {line}");
            }
        }
    }

    println!();
    println!(
        "Applied {} file(s), {} statement(s), {} skipped in {:.2}s",
        summary.files_applied(),
        summary.statements_executed(),
        summary.skipped_count(),
        summary.duration.as_secs_f64()
    );
}
