//! Apply and run commands - execute a change plan against the remote

use crate::cli::CliProgress;
use crate::cli::context::{CommandContext, RepoArgs};
use crate::cli::plan::generate_for_task;
use crate::cli::style::{Stylize, arrow, cross, hyperlink};
use anstream::println;
use dialoguer::Confirm;
use draftsmith::engine::{ExecutionOutcome, execute_plan};
use draftsmith::error::{Error, Result};
use draftsmith::plan::parse_plan;
use draftsmith::types::{ChangePlan, PatchOp};
use std::io::Read;
use std::path::Path;

/// Options for the apply command
#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    /// Base branch override
    pub base: Option<String>,
    /// Skip the confirmation prompt
    pub yes: bool,
}

/// Options for the run command
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Base branch override
    pub base: Option<String>,
    /// Skip the confirmation prompt
    pub yes: bool,
    /// Print the plan and stop before touching the remote
    pub dry_run: bool,
}

/// Read plan text from a file, or stdin for `-`
fn read_plan_source(source: &str) -> Result<String> {
    if source == "-" {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        return Ok(text);
    }
    std::fs::read_to_string(Path::new(source))
        .map_err(|e| Error::Config(format!("failed to read plan file {source}: {e}")))
}

/// Run the apply command with a plan (or raw model output) from `source`
pub async fn run_apply(repo: &RepoArgs, source: &str, options: ApplyOptions) -> Result<()> {
    // Recover and validate before any remote setup
    let plan = parse_plan(&read_plan_source(source)?)?;

    let ctx = CommandContext::new(repo).await?;
    execute_with_confirmation(&ctx, &plan, options.base.as_deref(), options.yes).await
}

/// Run the run command: generate a plan for `task`, then execute it
pub async fn run_run(repo: &RepoArgs, task: &str, options: RunOptions) -> Result<()> {
    let ctx = CommandContext::new(repo).await?;
    let base = ctx.base_branch(options.base.as_deref());

    let plan = generate_for_task(&ctx, task, &base, false).await?;

    if options.dry_run {
        print_plan_preview(&plan);
        println!("{}", "Dry run, nothing was pushed.".muted());
        return Ok(());
    }

    execute_with_confirmation(&ctx, &plan, Some(&base), options.yes).await
}

async fn execute_with_confirmation(
    ctx: &CommandContext,
    plan: &ChangePlan,
    base: Option<&str>,
    yes: bool,
) -> Result<()> {
    let options = ctx.config.engine_options(base);

    print_plan_preview(plan);
    if !yes {
        let prompt = format!(
            "Push {} patch(es) to {} as a new branch off {}?",
            plan.patches.len(),
            ctx.repository_label(),
            options.base_branch
        );
        if !Confirm::new()
            .with_prompt(prompt)
            .default(true)
            .interact()
            .map_err(|e| Error::Internal(format!("Failed to read confirmation: {e}")))?
        {
            println!("{}", "Aborted".muted());
            return Ok(());
        }
        println!();
    }

    let progress = CliProgress;
    let outcome = execute_plan(plan, ctx.platform.as_ref(), &options, &progress).await;
    report_outcome(outcome)
}

fn print_plan_preview(plan: &ChangePlan) {
    println!("{}", plan.summary.emphasis());
    for patch in &plan.patches {
        let op = match patch.op() {
            PatchOp::Create => "create".success(),
            PatchOp::Update => "update".warn(),
            PatchOp::Delete => "delete".failure(),
        };
        let size = patch
            .content()
            .map(|c| format!(" ({} bytes)", c.len()).muted())
            .unwrap_or_default();
        println!("  {} {op} {}{size}", arrow(), patch.path.accent());
    }
    println!();
}

/// Print the outcome; a failed run surfaces its error to the caller
fn report_outcome(outcome: ExecutionOutcome) -> Result<()> {
    match outcome {
        ExecutionOutcome::Opened {
            branch,
            applied,
            review,
        } => {
            println!();
            println!(
                "{} {} patch(es) on {} {} {}",
                "Done:".success(),
                applied.len(),
                branch.name.accent(),
                arrow(),
                hyperlink(&review.html_url, &review.html_url)
            );
            Ok(())
        }
        ExecutionOutcome::Failed(failure) => {
            let applied = failure.applied_indices();
            println!();
            println!("{} {} stage failed", cross(), failure.stage.emphasis());
            if let Some(index) = failure.failed_index {
                println!("  {} failing patch index: {index}", arrow());
            }
            println!("  {} applied patch indices: {applied:?}", arrow());
            match &failure.branch {
                Some(branch) => println!(
                    "  {} branch left on remote: {}",
                    arrow(),
                    branch.name.accent()
                ),
                None => println!("  {} no branch was created", arrow()),
            }
            Err(failure.error)
        }
    }
}
