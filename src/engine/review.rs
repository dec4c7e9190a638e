//! Review request creation

use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::types::{ChangePlan, PullRequest, WorkingBranch};
use std::fmt::Write as _;
use tracing::debug;

/// Options for the review request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewOptions {
    /// Title of the PR/MR
    pub title: String,
    /// Open as draft
    pub draft: bool,
}

impl Default for ReviewOptions {
    fn default() -> Self {
        Self {
            title: "AI change proposal".to_string(),
            draft: false,
        }
    }
}

/// Review body: the plan summary followed by one bullet per patch
pub fn render_review_body(plan: &ChangePlan) -> String {
    let mut body = plan.summary.trim().to_string();
    if !plan.patches.is_empty() {
        body.push_str("\n\n");
        for patch in &plan.patches {
            let _ = writeln!(body, "- `{}` {}", patch.op(), patch.path);
        }
    }
    body
}

/// Open a review request from `branch` into its base
///
/// Safe to call again after a failure: the working branch is untouched.
pub async fn open_review_request(
    platform: &dyn PlatformService,
    branch: &WorkingBranch,
    plan: &ChangePlan,
    options: &ReviewOptions,
) -> Result<PullRequest> {
    let body = render_review_body(plan);
    debug!(head = %branch.name, base = %branch.base, "opening review request");

    platform
        .create_pr_with_options(
            &branch.name,
            &branch.base,
            &options.title,
            Some(&body),
            options.draft,
        )
        .await
        .map_err(|e| match e {
            Error::ReviewRequest(_) => e,
            other => Error::ReviewRequest(other.to_string()),
        })
}
