//! Error types for draftsmith
//!
//! Every error carries a stable kind tag (see [`Error::kind`]) plus a
//! human-readable detail from its `Display` impl.

use thiserror::Error;

/// Errors produced while recovering, validating or executing a change plan
#[derive(Debug, Error)]
pub enum Error {
    /// Model output contained no `{ ... }` object boundary
    #[error("no JSON object boundary found: {0}")]
    Extraction(String),

    /// JSON object could not be parsed even after the repair pass
    #[error("malformed plan after repair: {reason}")]
    MalformedPlan {
        /// Parser message from the final attempt
        reason: String,
        /// The repaired substring, kept for diagnostics
        repaired: String,
    },

    /// Parsed JSON does not satisfy the change-plan contract
    #[error("schema violation at `{field}`: {reason}")]
    SchemaViolation {
        /// Qualified field name, e.g. `patches[1].op`
        field: String,
        /// What is wrong with it
        reason: String,
    },

    /// Plan is well-formed but has nothing to apply
    #[error("plan contains no patches")]
    EmptyPlan,

    /// Base branch does not exist on the remote
    #[error("base branch not found: {0}")]
    BaseNotFound(String),

    /// Derived working branch name is already taken
    #[error("branch already exists: {0}")]
    BranchExists(String),

    /// Delete target does not exist on the working branch
    #[error("file not found on working branch: {path}")]
    NotFound {
        /// Repository-relative path
        path: String,
    },

    /// Remote rejected a write because the observed identity is stale
    #[error("conflicting write to {path}: {detail}")]
    RemoteWriteConflict {
        /// Repository-relative path
        path: String,
        /// Host-provided message
        detail: String,
    },

    /// Host refused to open the review request
    #[error("failed to open review request: {0}")]
    ReviewRequest(String),

    /// GitHub API error
    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    /// GitLab API error
    #[error("GitLab API error: {0}")]
    GitLabApi(String),

    /// Generic platform error (used by test doubles and detection)
    #[error("platform error: {0}")]
    Platform(String),

    /// Completion provider error
    #[error("completion provider error: {0}")]
    Completion(String),

    /// Authentication error
    #[error("authentication error: {0}")]
    Auth(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Deploy hook error
    #[error("deploy hook error: {0}")]
    Deploy(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),

    /// I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error outside plan recovery
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// HTTP transport error
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Octocrab error
    #[error("GitHub API error: {0}")]
    Octocrab(#[from] octocrab::Error),
}

impl Error {
    /// Stable, machine-readable tag for this error
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Extraction(_) => "extraction_error",
            Self::MalformedPlan { .. } => "malformed_plan",
            Self::SchemaViolation { .. } => "schema_violation",
            Self::EmptyPlan => "empty_plan",
            Self::BaseNotFound(_) => "base_not_found",
            Self::BranchExists(_) => "branch_exists",
            Self::NotFound { .. } => "not_found",
            Self::RemoteWriteConflict { .. } => "remote_write_conflict",
            Self::ReviewRequest(_) => "review_request_error",
            Self::GitHubApi(_) | Self::Octocrab(_) => "github_api",
            Self::GitLabApi(_) => "gitlab_api",
            Self::Platform(_) => "platform",
            Self::Completion(_) => "completion",
            Self::Auth(_) => "auth",
            Self::Config(_) => "config",
            Self::Deploy(_) => "deploy",
            Self::Internal(_) => "internal",
            Self::Io(_) => "io",
            Self::Json(_) => "json",
            Self::Http(_) => "http",
        }
    }

    /// Whether this error happened before any remote state was touched
    pub const fn is_pre_execution(&self) -> bool {
        matches!(
            self,
            Self::Extraction(_) | Self::MalformedPlan { .. } | Self::SchemaViolation { .. }
        )
    }

    pub(crate) fn schema(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SchemaViolation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for draftsmith
pub type Result<T> = std::result::Result<T, Error>;
