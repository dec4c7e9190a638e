//! Core types for draftsmith

use serde::{Deserialize, Serialize, Serializer};

/// Operation tag of a patch, as it appears on the wire (`"op"`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOp {
    /// Create a new file
    Create,
    /// Replace the content of a file
    Update,
    /// Remove a file
    Delete,
}

impl PatchOp {
    /// Parse an exact wire tag; anything else is unrecognized
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "create" => Some(Self::Create),
            "update" => Some(Self::Update),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }

    /// Wire tag for this operation
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl std::fmt::Display for PatchOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a patch does to its file
///
/// Content is only representable for writes; a missing content on the wire
/// has already been normalized to an empty string by the validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchChange {
    /// Create a file with the given content
    Create {
        /// Full file content
        content: String,
    },
    /// Replace a file's content
    Update {
        /// Full file content
        content: String,
    },
    /// Remove a file
    Delete,
}

/// One file-level mutation instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    /// Repository-relative path (never empty)
    pub path: String,
    /// The mutation
    pub change: PatchChange,
}

impl Patch {
    /// Create-patch helper
    pub fn create(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            change: PatchChange::Create {
                content: content.into(),
            },
        }
    }

    /// Update-patch helper
    pub fn update(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            change: PatchChange::Update {
                content: content.into(),
            },
        }
    }

    /// Delete-patch helper
    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            change: PatchChange::Delete,
        }
    }

    /// Operation tag of this patch
    pub const fn op(&self) -> PatchOp {
        match self.change {
            PatchChange::Create { .. } => PatchOp::Create,
            PatchChange::Update { .. } => PatchOp::Update,
            PatchChange::Delete => PatchOp::Delete,
        }
    }

    /// Content to write, `None` for deletes
    pub fn content(&self) -> Option<&str> {
        match &self.change {
            PatchChange::Create { content } | PatchChange::Update { content } => Some(content),
            PatchChange::Delete => None,
        }
    }
}

#[derive(Serialize)]
struct WirePatch<'a> {
    path: &'a str,
    op: PatchOp,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<&'a str>,
}

impl Serialize for Patch {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        WirePatch {
            path: &self.path,
            op: self.op(),
            content: self.content(),
        }
        .serialize(serializer)
    }
}

/// A validated change plan
///
/// Serializes back to the wire contract; parsing goes through
/// [`crate::plan::validate_plan`] so that every field is checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangePlan {
    /// Human-readable summary (may be empty)
    pub summary: String,
    /// Ordered patches
    pub patches: Vec<Patch>,
}

impl ChangePlan {
    /// Whether there is anything to apply
    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }
}

/// Current identity of a file on a branch
///
/// `blob_sha` is `Some` iff the file exists. Never cache this across
/// mutations: every write on the branch changes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFileIdentity {
    /// Repository-relative path
    pub path: String,
    /// Content fingerprint, absent when the file does not exist
    pub blob_sha: Option<String>,
    /// Token the host expects on a keyed write or delete.
    ///
    /// GitHub keys writes by blob SHA, GitLab by the last commit that
    /// touched the file. Always `Some` when `blob_sha` is.
    pub write_token: Option<String>,
}

impl RemoteFileIdentity {
    /// Identity of a file that does not exist
    pub fn absent(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            blob_sha: None,
            write_token: None,
        }
    }

    /// Identity of an existing file keyed by its blob SHA
    pub fn present(path: impl Into<String>, blob_sha: impl Into<String>) -> Self {
        let sha = blob_sha.into();
        Self {
            path: path.into(),
            write_token: Some(sha.clone()),
            blob_sha: Some(sha),
        }
    }

    /// Whether the file exists
    pub const fn exists(&self) -> bool {
        self.blob_sha.is_some()
    }
}

/// A disposable branch that stages one plan's mutations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingBranch {
    /// Branch name
    pub name: String,
    /// Base branch it was created from
    pub base: String,
    /// Commit the branch was created at
    pub base_sha: String,
}

/// A file write request
#[derive(Debug, Clone)]
pub struct FileWrite<'a> {
    /// Target branch
    pub branch: &'a str,
    /// Repository-relative path
    pub path: &'a str,
    /// Content already encoded for transport (base64)
    pub encoded_content: String,
    /// Commit message
    pub message: String,
    /// Observed identity for updates, `None` for creates
    pub prior: Option<&'a str>,
}

/// A pull request / merge request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    /// PR/MR number
    pub number: u64,
    /// Web URL for the PR/MR
    pub html_url: String,
    /// Base branch name
    pub base_ref: String,
    /// Head branch name
    pub head_ref: String,
    /// PR/MR title
    pub title: String,
    /// Whether PR is a draft
    pub is_draft: bool,
}

/// Detected platform type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// GitHub or GitHub Enterprise
    GitHub,
    /// GitLab or self-hosted GitLab
    GitLab,
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GitHub => write!(f, "GitHub"),
            Self::GitLab => write!(f, "GitLab"),
        }
    }
}

/// Platform configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformConfig {
    /// Platform type
    pub platform: Platform,
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Custom host (None for github.com/gitlab.com)
    pub host: Option<String>,
}
