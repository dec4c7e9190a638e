//! Change-plan recovery
//!
//! Two pure steps, neither of which touches the remote:
//! 1. Extract - recover a JSON object from raw model text (bounded repair)
//! 2. Validate - enforce the change-plan contract, field by field
//!
//! [`generate_plan`] puts the completion provider in front of both.

mod extract;
mod prompt;
mod validate;

pub use extract::{Extracted, extract_json, repair};
pub use prompt::{build_plan_request, summarize_tree};
pub use validate::validate_plan;

use crate::completion::CompletionService;
use crate::error::{Error, Result};
use crate::types::ChangePlan;
use tracing::debug;

/// Recover and validate a change plan from untrusted text
pub fn parse_plan(raw: &str) -> Result<ChangePlan> {
    let extracted = extract_json(raw)?;
    debug!(repaired = extracted.repaired, "extracted plan JSON");
    validate_plan(&extracted.value)
}

/// Ask the completion provider for a plan and validate its answer
pub async fn generate_plan(
    completion: &dyn CompletionService,
    task: &str,
    tree_summary: Option<&str>,
) -> Result<ChangePlan> {
    let task = task.trim();
    if task.is_empty() {
        return Err(Error::Config("task must not be empty".to_string()));
    }

    let request = build_plan_request(task, tree_summary);
    let raw = completion.complete(&request).await?;
    debug!(chars = raw.len(), "received completion");

    let plan = parse_plan(&raw)?;
    debug!(patches = plan.patches.len(), "generated plan");
    Ok(plan)
}
