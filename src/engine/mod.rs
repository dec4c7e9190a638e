//! Change-plan execution engine
//!
//! Three strictly sequential, effectful stages against the remote:
//! 1. Provision - create a disposable working branch from the base head
//! 2. Apply - apply every patch in plan order, fail-fast, no rollback
//! 3. Review - open a review request from the working branch to the base
//!
//! Nothing here runs before the plan has been validated by [`crate::plan`].

mod apply;
mod execute;
mod progress;
mod provision;
mod review;

pub use apply::{AppliedAction, AppliedPatch, ApplyReport, PatchFailure, apply_patches};
pub use execute::{EngineOptions, ExecutionFailure, ExecutionOutcome, Stage, execute_plan};
pub use progress::{NoopProgress, ProgressCallback};
pub use provision::{BranchNaming, NamingStyle, provision_branch};
pub use review::{ReviewOptions, open_review_request, render_review_body};
