//! Plan execution: provision, apply, review
//!
//! Stages run strictly in order and the first failure ends the run. No
//! stage undoes the remote effects of an earlier one; the outcome records
//! exactly what was left behind so the caller can inspect or retry.

use crate::engine::apply::{AppliedPatch, apply_patches};
use crate::engine::progress::ProgressCallback;
use crate::engine::provision::{BranchNaming, provision_branch};
use crate::engine::review::{ReviewOptions, open_review_request};
use crate::error::Error;
use crate::platform::PlatformService;
use crate::types::{ChangePlan, PullRequest, WorkingBranch};
use std::fmt;
use tracing::{debug, info};

/// Knobs for one execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Branch the working branch is created from and the review targets
    pub base_branch: String,
    /// Working branch naming
    pub naming: BranchNaming,
    /// Review request options
    pub review: ReviewOptions,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            base_branch: "main".to_string(),
            naming: BranchNaming::default(),
            review: ReviewOptions::default(),
        }
    }
}

/// Stage an execution stopped in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Creating the working branch
    Provision,
    /// Applying patches
    Apply,
    /// Opening the review request
    Review,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Provision => write!(f, "provision"),
            Self::Apply => write!(f, "apply"),
            Self::Review => write!(f, "review"),
        }
    }
}

/// Everything known about a failed execution
#[derive(Debug)]
pub struct ExecutionFailure {
    /// Stage that failed
    pub stage: Stage,
    /// Working branch, if one was created
    pub branch: Option<WorkingBranch>,
    /// Plan index of the failing patch, for apply failures
    pub failed_index: Option<usize>,
    /// Patches committed before the failure
    pub applied: Vec<AppliedPatch>,
    /// Cause
    pub error: Error,
}

impl ExecutionFailure {
    /// Plan indices committed before the failure
    pub fn applied_indices(&self) -> Vec<usize> {
        self.applied.iter().map(|p| p.index).collect()
    }
}

/// Result of executing a change plan
#[derive(Debug)]
pub enum ExecutionOutcome {
    /// All patches applied and the review request is open
    Opened {
        /// Working branch holding the commits
        branch: WorkingBranch,
        /// Patches committed, in plan order
        applied: Vec<AppliedPatch>,
        /// The opened review request
        review: PullRequest,
    },
    /// Execution stopped early
    Failed(ExecutionFailure),
}

impl ExecutionOutcome {
    /// Check if the review request was opened
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Opened { .. })
    }

    /// URL of the opened review request
    pub fn review_url(&self) -> Option<&str> {
        match self {
            Self::Opened { review, .. } => Some(&review.html_url),
            Self::Failed(_) => None,
        }
    }

    /// Working branch left on the remote, if any
    pub const fn branch(&self) -> Option<&WorkingBranch> {
        match self {
            Self::Opened { branch, .. } => Some(branch),
            Self::Failed(failure) => failure.branch.as_ref(),
        }
    }

    /// Patches committed to the working branch
    pub fn applied(&self) -> &[AppliedPatch] {
        match self {
            Self::Opened { applied, .. } => applied,
            Self::Failed(failure) => &failure.applied,
        }
    }

    /// Failure details, if the run stopped early
    pub const fn failure(&self) -> Option<&ExecutionFailure> {
        match self {
            Self::Opened { .. } => None,
            Self::Failed(failure) => Some(failure),
        }
    }
}

/// Execute a validated change plan against the remote
///
/// An empty plan fails before anything is created on the remote.
pub async fn execute_plan(
    plan: &ChangePlan,
    platform: &dyn PlatformService,
    options: &EngineOptions,
    progress: &dyn ProgressCallback,
) -> ExecutionOutcome {
    if plan.is_empty() {
        return ExecutionOutcome::Failed(ExecutionFailure {
            stage: Stage::Apply,
            branch: None,
            failed_index: None,
            applied: Vec::new(),
            error: Error::EmptyPlan,
        });
    }

    progress
        .on_message(&format!("Creating working branch from {}", options.base_branch))
        .await;
    let branch =
        match provision_branch(platform, &options.base_branch, &options.naming, plan).await {
            Ok(branch) => branch,
            Err(error) => {
                return ExecutionOutcome::Failed(ExecutionFailure {
                    stage: Stage::Provision,
                    branch: None,
                    failed_index: None,
                    applied: Vec::new(),
                    error,
                });
            }
        };
    progress.on_branch_created(&branch).await;

    let report = match apply_patches(plan, &branch, platform, progress).await {
        Ok(report) => report,
        Err(error) => {
            return ExecutionOutcome::Failed(ExecutionFailure {
                stage: Stage::Apply,
                branch: Some(branch),
                failed_index: None,
                applied: Vec::new(),
                error,
            });
        }
    };

    if let Some(failure) = report.failure {
        debug!(index = failure.index, path = %failure.path, "apply stopped");
        return ExecutionOutcome::Failed(ExecutionFailure {
            stage: Stage::Apply,
            branch: Some(branch),
            failed_index: Some(failure.index),
            applied: report.applied,
            error: failure.error,
        });
    }

    progress.on_message("Opening review request").await;
    match open_review_request(platform, &branch, plan, &options.review).await {
        Ok(review) => {
            progress.on_review_opened(&review).await;
            info!(branch = %branch.name, number = review.number, "review request opened");
            ExecutionOutcome::Opened {
                branch,
                applied: report.applied,
                review,
            }
        }
        Err(error) => ExecutionOutcome::Failed(ExecutionFailure {
            stage: Stage::Review,
            branch: Some(branch),
            failed_index: None,
            applied: report.applied,
            error,
        }),
    }
}
