//! Progress reporting hooks

use crate::engine::apply::AppliedPatch;
use crate::types::{PullRequest, WorkingBranch};
use async_trait::async_trait;

/// Receives status updates while a plan executes
#[async_trait]
pub trait ProgressCallback: Send + Sync {
    /// Free-form status line
    async fn on_message(&self, message: &str);

    /// Working branch is ready
    async fn on_branch_created(&self, branch: &WorkingBranch) {
        self.on_message(&format!("Created branch {} from {}", branch.name, branch.base))
            .await;
    }

    /// A patch was committed to the working branch
    async fn on_patch_applied(&self, patch: &AppliedPatch, total: usize) {
        self.on_message(&format!(
            "[{}/{total}] {} {}",
            patch.index + 1,
            patch.action,
            patch.path
        ))
        .await;
    }

    /// Review request is open
    async fn on_review_opened(&self, review: &PullRequest) {
        self.on_message(&format!("Opened #{}: {}", review.number, review.html_url))
            .await;
    }
}

/// Progress sink that ignores everything
pub struct NoopProgress;

#[async_trait]
impl ProgressCallback for NoopProgress {
    async fn on_message(&self, _message: &str) {}
}
