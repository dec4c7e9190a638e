//! Sequential, fail-fast mutation applier

use crate::engine::progress::ProgressCallback;
use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::types::{ChangePlan, FileWrite, Patch, PatchChange, WorkingBranch};
use base64::prelude::{BASE64_STANDARD, Engine as _};
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

/// What a committed patch did to the branch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AppliedAction {
    /// File did not exist before the write
    Created,
    /// File existed and was overwritten
    Updated,
    /// File was removed
    Deleted,
}

impl fmt::Display for AppliedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Updated => write!(f, "updated"),
            Self::Deleted => write!(f, "deleted"),
        }
    }
}

/// A patch that was committed to the working branch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedPatch {
    /// Position of the patch in the plan
    pub index: usize,
    /// Repository path
    pub path: String,
    /// Effect on the branch
    pub action: AppliedAction,
    /// New blob SHA, when the host reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blob_sha: Option<String>,
}

/// The first patch that could not be applied
#[derive(Debug)]
pub struct PatchFailure {
    /// Position of the failed patch in the plan
    pub index: usize,
    /// Path the failed patch targeted
    pub path: String,
    /// Cause
    pub error: Error,
}

/// Result of applying a plan to a working branch
#[derive(Debug, Default)]
pub struct ApplyReport {
    /// Patches committed, in plan order
    pub applied: Vec<AppliedPatch>,
    /// Set when application stopped early
    pub failure: Option<PatchFailure>,
}

impl ApplyReport {
    /// Check if every patch was applied
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    /// Plan indices that were committed
    pub fn applied_indices(&self) -> Vec<usize> {
        self.applied.iter().map(|p| p.index).collect()
    }
}

/// Apply every patch of `plan` to `branch`, in order
///
/// Each patch is one commit. Application stops at the first failure and
/// leaves earlier commits in place. An empty plan is rejected before any
/// remote call.
pub async fn apply_patches(
    plan: &ChangePlan,
    branch: &WorkingBranch,
    platform: &dyn PlatformService,
    progress: &dyn ProgressCallback,
) -> Result<ApplyReport> {
    if plan.is_empty() {
        return Err(Error::EmptyPlan);
    }

    let total = plan.patches.len();
    let mut report = ApplyReport::default();

    for (index, patch) in plan.patches.iter().enumerate() {
        match apply_one(index, patch, &branch.name, platform).await {
            Ok(applied) => {
                progress.on_patch_applied(&applied, total).await;
                report.applied.push(applied);
            }
            Err(error) => {
                warn!(index, path = %patch.path, %error, "patch failed, stopping");
                report.failure = Some(PatchFailure {
                    index,
                    path: patch.path.clone(),
                    error,
                });
                break;
            }
        }
    }

    Ok(report)
}

async fn apply_one(
    index: usize,
    patch: &Patch,
    branch: &str,
    platform: &dyn PlatformService,
) -> Result<AppliedPatch> {
    let path = patch.path.as_str();

    match &patch.change {
        PatchChange::Delete => {
            let identity = platform.file_identity(branch, path).await?;
            let Some(token) = identity.write_token.as_deref() else {
                return Err(Error::NotFound {
                    path: path.to_string(),
                });
            };

            platform
                .delete_file(branch, path, token, &format!("chore: delete {path}"))
                .await?;
            debug!(index, path, "deleted");

            Ok(AppliedPatch {
                index,
                path: path.to_string(),
                action: AppliedAction::Deleted,
                blob_sha: None,
            })
        }
        PatchChange::Create { content } | PatchChange::Update { content } => {
            let encoded_content = BASE64_STANDARD.encode(content.as_bytes());

            // Existence, not the declared op, decides between create and update
            let identity = platform.file_identity(branch, path).await?;
            let (action, verb) = if identity.exists() {
                (AppliedAction::Updated, "update")
            } else {
                (AppliedAction::Created, "create")
            };

            let write = FileWrite {
                branch,
                path,
                encoded_content,
                message: format!("feat: {verb} {path}"),
                prior: identity.write_token.as_deref(),
            };
            let blob_sha = platform.write_file(&write).await?;
            debug!(index, path, %action, "wrote");

            Ok(AppliedPatch {
                index,
                path: path.to_string(),
                action,
                blob_sha,
            })
        }
    }
}
