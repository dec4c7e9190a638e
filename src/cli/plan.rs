//! Plan command - ask the model for a change plan without applying it

use crate::cli::context::{CommandContext, RepoArgs};
use crate::cli::style::{Stylize, check, spinner_style};
use anstream::{eprintln, println};
use draftsmith::error::Result;
use draftsmith::plan::{generate_plan, summarize_tree};
use draftsmith::types::ChangePlan;
use indicatif::ProgressBar;
use std::time::Duration;

/// Options for the plan command
#[derive(Debug, Clone, Default)]
pub struct PlanOptions {
    /// Base branch override
    pub base: Option<String>,
    /// Skip sending the repository tree
    pub no_tree: bool,
}

/// Generate a plan for `task` with repository context from `ctx`
pub async fn generate_for_task(
    ctx: &CommandContext,
    task: &str,
    base: &str,
    no_tree: bool,
) -> Result<ChangePlan> {
    let tree = if no_tree {
        None
    } else {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(spinner_style());
        spinner.set_message(format!("Listing files on {}...", base.emphasis()));
        spinner.enable_steady_tick(Duration::from_millis(80));

        let files = ctx.platform.list_files(base).await?;
        spinner.finish_and_clear();
        eprintln!("{} Listed {} file(s) on {}", check(), files.len(), base.accent());
        Some(summarize_tree(base, &files, ctx.config.context.tree_limit))
    };

    let completion = ctx.completion_client()?;
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(spinner_style());
    spinner.set_message(format!(
        "Asking {} for a plan...",
        ctx.config.model.model.emphasis()
    ));
    spinner.enable_steady_tick(Duration::from_millis(80));

    let result = generate_plan(&completion, task, tree.as_deref()).await;
    spinner.finish_and_clear();
    let plan = result?;
    eprintln!("{} Received plan with {} patch(es)", check(), plan.patches.len());
    Ok(plan)
}

/// Run the plan command: print the validated plan as JSON on stdout
pub async fn run_plan(repo: &RepoArgs, task: &str, options: PlanOptions) -> Result<()> {
    let ctx = CommandContext::new(repo).await?;
    let base = ctx.base_branch(options.base.as_deref());

    let plan = generate_for_task(&ctx, task, &base, options.no_tree).await?;
    println!("{}", serde_json::to_string_pretty(&plan)?);
    Ok(())
}
