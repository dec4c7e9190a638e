//! Platform services for GitHub and GitLab
//!
//! Provides a unified interface for the remote operations a change plan
//! needs: branch refs, file contents and review requests.

mod detection;
mod factory;
mod github;
mod gitlab;

pub use detection::{detect_platform, parse_repo_info};
pub use factory::create_platform_service;
pub use github::GitHubService;
pub use gitlab::GitLabService;

use crate::error::Result;
use crate::types::{FileWrite, PlatformConfig, PullRequest, RemoteFileIdentity};
use async_trait::async_trait;

/// Platform service trait for repository and PR/MR operations
///
/// Every call is a single blocking round trip. Implementations must not
/// cache file identities: callers rely on each lookup observing all prior
/// writes to the branch.
#[async_trait]
pub trait PlatformService: Send + Sync {
    /// Head commit SHA of a branch, `None` if the branch does not exist
    async fn branch_head(&self, branch: &str) -> Result<Option<String>>;

    /// Create a branch ref at `sha`
    ///
    /// Fails with [`Error::BranchExists`](crate::error::Error::BranchExists)
    /// if the name is taken.
    async fn create_branch(&self, name: &str, sha: &str) -> Result<()>;

    /// Current identity of a file on a branch
    async fn file_identity(&self, branch: &str, path: &str) -> Result<RemoteFileIdentity>;

    /// Decoded content of a file on a branch, `None` if it does not exist
    async fn read_file(&self, branch: &str, path: &str) -> Result<Option<String>>;

    /// Create or update a file
    ///
    /// `write.prior` must carry the observed write token for an update and be
    /// `None` for a create. Returns the new blob SHA when the host reports it.
    async fn write_file(&self, write: &FileWrite<'_>) -> Result<Option<String>>;

    /// Delete a file, keyed by its observed write token
    async fn delete_file(&self, branch: &str, path: &str, prior: &str, message: &str)
    -> Result<()>;

    /// All file paths on a branch
    async fn list_files(&self, branch: &str) -> Result<Vec<String>>;

    /// Create a new PR with explicit body and draft options.
    ///
    /// Any host rejection is reported as
    /// [`Error::ReviewRequest`](crate::error::Error::ReviewRequest).
    async fn create_pr_with_options(
        &self,
        head: &str,
        base: &str,
        title: &str,
        body: Option<&str>,
        draft: bool,
    ) -> Result<PullRequest>;

    /// Get the platform configuration
    fn config(&self) -> &PlatformConfig;
}

/// Percent-encode each segment of a repository path, keeping separators
pub(crate) fn encode_path_segments(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
