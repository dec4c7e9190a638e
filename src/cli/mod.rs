//! CLI commands

pub mod apply;
pub mod auth;
pub mod config;
pub mod context;
pub mod deploy;
pub mod inspect;
pub mod plan;
pub mod style;

use anstream::println;
use async_trait::async_trait;
use draftsmith::engine::{AppliedAction, AppliedPatch, ProgressCallback};
use draftsmith::types::{PullRequest, WorkingBranch};
use style::{Stylize, arrow, check};

/// Progress reporter printing one line per event
pub struct CliProgress;

#[async_trait]
impl ProgressCallback for CliProgress {
    async fn on_message(&self, message: &str) {
        println!("{}", message.muted());
    }

    async fn on_branch_created(&self, branch: &WorkingBranch) {
        println!(
            "{} Created {} from {}",
            check(),
            branch.name.accent(),
            branch.base.emphasis()
        );
    }

    async fn on_patch_applied(&self, patch: &AppliedPatch, total: usize) {
        let action = match patch.action {
            AppliedAction::Created => "created".success(),
            AppliedAction::Updated => "updated".warn(),
            AppliedAction::Deleted => "deleted".failure(),
        };
        println!(
            "  {} {} {action} {}",
            arrow(),
            format!("[{}/{total}]", patch.index + 1).muted(),
            patch.path.accent()
        );
    }

    async fn on_review_opened(&self, review: &PullRequest) {
        println!(
            "{} Opened #{} {}",
            check(),
            review.number,
            style::hyperlink(&review.html_url, &review.html_url)
        );
    }
}
