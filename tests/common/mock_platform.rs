//! Mock platform service for testing
//!
//! An in-memory repository: branches hold files, every write bumps the blob
//! SHA, and every call is recorded in order so tests can assert on the exact
//! sequence of remote operations.

#![allow(dead_code)]

use async_trait::async_trait;
use base64::prelude::{BASE64_STANDARD, Engine as _};
use draftsmith::error::{Error, Result};
use draftsmith::platform::PlatformService;
use draftsmith::types::{FileWrite, PlatformConfig, PullRequest, RemoteFileIdentity};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Head SHA of the seeded base branch
pub const BASE_SHA: &str = "base-sha";

/// One recorded platform call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    BranchHead(String),
    CreateBranch {
        name: String,
        sha: String,
    },
    FileIdentity {
        branch: String,
        path: String,
    },
    ReadFile {
        branch: String,
        path: String,
    },
    WriteFile {
        branch: String,
        path: String,
        content: String,
        message: String,
        prior: Option<String>,
    },
    DeleteFile {
        branch: String,
        path: String,
        prior: String,
        message: String,
    },
    ListFiles(String),
    CreatePr {
        head: String,
        base: String,
        title: String,
        body: Option<String>,
        draft: bool,
    },
}

impl Call {
    /// Whether this call changes file contents
    pub const fn is_mutation(&self) -> bool {
        matches!(self, Self::WriteFile { .. } | Self::DeleteFile { .. })
    }
}

#[derive(Debug, Clone)]
struct MockFile {
    content: String,
    sha: String,
}

#[derive(Debug, Clone)]
struct MockBranch {
    head: String,
    files: BTreeMap<String, MockFile>,
}

/// In-memory platform service
pub struct MockPlatformService {
    config: PlatformConfig,
    branches: Mutex<HashMap<String, MockBranch>>,
    next_sha: AtomicU64,
    next_pr_number: AtomicU64,
    calls: Mutex<Vec<Call>>,
    // One-shot error injection
    error_on_create_branch: Mutex<Option<Error>>,
    error_on_write: Mutex<HashMap<String, String>>,
    error_on_create_pr: Mutex<Option<String>>,
}

impl MockPlatformService {
    /// Create a mock with an empty `main` branch
    pub fn with_config(config: PlatformConfig) -> Self {
        let mut branches = HashMap::new();
        branches.insert(
            "main".to_string(),
            MockBranch {
                head: BASE_SHA.to_string(),
                files: BTreeMap::new(),
            },
        );

        Self {
            config,
            branches: Mutex::new(branches),
            next_sha: AtomicU64::new(1),
            next_pr_number: AtomicU64::new(1),
            calls: Mutex::new(Vec::new()),
            error_on_create_branch: Mutex::new(None),
            error_on_write: Mutex::new(HashMap::new()),
            error_on_create_pr: Mutex::new(None),
        }
    }

    /// Create a mock whose `main` branch holds `files`
    pub fn with_files(config: PlatformConfig, files: &[(&str, &str)]) -> Self {
        let mock = Self::with_config(config);
        for (path, content) in files {
            mock.seed_file("main", path, content);
        }
        mock
    }

    /// Put a file on a branch without recording a call
    pub fn seed_file(&self, branch: &str, path: &str, content: &str) {
        let sha = self.fresh_sha("blob");
        let mut branches = self.branches.lock().unwrap();
        let target = branches
            .entry(branch.to_string())
            .or_insert_with(|| MockBranch {
                head: format!("{branch}-head"),
                files: BTreeMap::new(),
            });
        target.files.insert(
            path.to_string(),
            MockFile {
                content: content.to_string(),
                sha,
            },
        );
    }

    fn fresh_sha(&self, kind: &str) -> String {
        format!("{kind}-{}", self.next_sha.fetch_add(1, Ordering::SeqCst))
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    // === Error injection methods ===

    /// Make the next `create_branch` return `error`
    pub fn fail_create_branch(&self, error: Error) {
        *self.error_on_create_branch.lock().unwrap() = Some(error);
    }

    /// Make the next write or delete of `path` fail with a conflict
    pub fn fail_write_on(&self, path: &str, detail: &str) {
        self.error_on_write
            .lock()
            .unwrap()
            .insert(path.to_string(), detail.to_string());
    }

    /// Make the next `create_pr` fail
    pub fn fail_create_pr(&self, msg: &str) {
        *self.error_on_create_pr.lock().unwrap() = Some(msg.to_string());
    }

    /// Remove the base branch
    pub fn drop_branch(&self, name: &str) {
        self.branches.lock().unwrap().remove(name);
    }

    // === State inspection ===

    /// Current content of a file on a branch
    pub fn file_content(&self, branch: &str, path: &str) -> Option<String> {
        self.branches
            .lock()
            .unwrap()
            .get(branch)
            .and_then(|b| b.files.get(path))
            .map(|f| f.content.clone())
    }

    /// Current blob SHA of a file on a branch
    pub fn file_sha(&self, branch: &str, path: &str) -> Option<String> {
        self.branches
            .lock()
            .unwrap()
            .get(branch)
            .and_then(|b| b.files.get(path))
            .map(|f| f.sha.clone())
    }

    /// Paths on a branch, sorted
    pub fn file_paths(&self, branch: &str) -> Vec<String> {
        self.branches
            .lock()
            .unwrap()
            .get(branch)
            .map(|b| b.files.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Whether a branch exists
    pub fn has_branch(&self, name: &str) -> bool {
        self.branches.lock().unwrap().contains_key(name)
    }

    /// Number of branches, `main` included
    pub fn branch_count(&self) -> usize {
        self.branches.lock().unwrap().len()
    }

    // === Call tracking ===

    /// Every call in order
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Writes and deletes in order
    pub fn mutation_calls(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutation).collect()
    }

    /// Paths touched by writes and deletes, in order
    pub fn mutated_paths(&self) -> Vec<String> {
        self.mutation_calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::WriteFile { path, .. } | Call::DeleteFile { path, .. } => Some(path),
                _ => None,
            })
            .collect()
    }

    /// Review request calls
    pub fn create_pr_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::CreatePr { .. }))
            .collect()
    }

    /// Number of `create_branch` calls
    pub fn create_branch_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::CreateBranch { .. }))
            .count()
    }

    /// Assert a review request was opened from `head` into `base`
    pub fn assert_create_pr_called(&self, head: &str, base: &str) {
        let calls = self.create_pr_calls();
        assert!(
            calls.iter().any(|c| matches!(
                c,
                Call::CreatePr { head: h, base: b, .. } if h == head && b == base
            )),
            "expected create_pr({head}, {base}), got {calls:?}"
        );
    }

    /// Assert no remote call happened at all
    pub fn assert_untouched(&self) {
        let calls = self.calls();
        assert!(calls.is_empty(), "expected no remote calls, got {calls:?}");
    }
}

#[async_trait]
impl PlatformService for MockPlatformService {
    async fn branch_head(&self, branch: &str) -> Result<Option<String>> {
        self.record(Call::BranchHead(branch.to_string()));
        Ok(self
            .branches
            .lock()
            .unwrap()
            .get(branch)
            .map(|b| b.head.clone()))
    }

    async fn create_branch(&self, name: &str, sha: &str) -> Result<()> {
        self.record(Call::CreateBranch {
            name: name.to_string(),
            sha: sha.to_string(),
        });

        if let Some(error) = self.error_on_create_branch.lock().unwrap().take() {
            return Err(error);
        }

        let mut branches = self.branches.lock().unwrap();
        if branches.contains_key(name) {
            return Err(Error::BranchExists(name.to_string()));
        }
        let source = branches
            .values()
            .find(|b| b.head == sha)
            .cloned()
            .ok_or_else(|| Error::Platform(format!("unknown commit {sha}")))?;
        branches.insert(name.to_string(), source);
        Ok(())
    }

    async fn file_identity(&self, branch: &str, path: &str) -> Result<RemoteFileIdentity> {
        self.record(Call::FileIdentity {
            branch: branch.to_string(),
            path: path.to_string(),
        });

        let branches = self.branches.lock().unwrap();
        let branch = branches
            .get(branch)
            .ok_or_else(|| Error::Platform(format!("no branch {branch}")))?;
        Ok(match branch.files.get(path) {
            Some(file) => RemoteFileIdentity::present(path, file.sha.clone()),
            None => RemoteFileIdentity::absent(path),
        })
    }

    async fn read_file(&self, branch: &str, path: &str) -> Result<Option<String>> {
        self.record(Call::ReadFile {
            branch: branch.to_string(),
            path: path.to_string(),
        });
        Ok(self.file_content(branch, path))
    }

    async fn write_file(&self, write: &FileWrite<'_>) -> Result<Option<String>> {
        let bytes = BASE64_STANDARD
            .decode(&write.encoded_content)
            .map_err(|e| Error::Platform(format!("content is not base64: {e}")))?;
        let content = String::from_utf8(bytes)
            .map_err(|e| Error::Platform(format!("content is not UTF-8: {e}")))?;

        self.record(Call::WriteFile {
            branch: write.branch.to_string(),
            path: write.path.to_string(),
            content: content.clone(),
            message: write.message.clone(),
            prior: write.prior.map(ToString::to_string),
        });

        if let Some(detail) = self.error_on_write.lock().unwrap().remove(write.path) {
            return Err(Error::RemoteWriteConflict {
                path: write.path.to_string(),
                detail,
            });
        }

        let sha = self.fresh_sha("blob");
        let commit = self.fresh_sha("commit");
        let mut branches = self.branches.lock().unwrap();
        let branch = branches
            .get_mut(write.branch)
            .ok_or_else(|| Error::Platform(format!("no branch {}", write.branch)))?;

        // Optimistic concurrency: the caller must present the current SHA
        let current = branch.files.get(write.path).map(|f| f.sha.as_str());
        if current != write.prior {
            return Err(Error::RemoteWriteConflict {
                path: write.path.to_string(),
                detail: format!("expected {current:?}, got {:?}", write.prior),
            });
        }

        branch.files.insert(
            write.path.to_string(),
            MockFile {
                content,
                sha: sha.clone(),
            },
        );
        branch.head = commit;
        Ok(Some(sha))
    }

    async fn delete_file(
        &self,
        branch: &str,
        path: &str,
        prior: &str,
        message: &str,
    ) -> Result<()> {
        self.record(Call::DeleteFile {
            branch: branch.to_string(),
            path: path.to_string(),
            prior: prior.to_string(),
            message: message.to_string(),
        });

        if let Some(detail) = self.error_on_write.lock().unwrap().remove(path) {
            return Err(Error::RemoteWriteConflict {
                path: path.to_string(),
                detail,
            });
        }

        let commit = self.fresh_sha("commit");
        let mut branches = self.branches.lock().unwrap();
        let target = branches
            .get_mut(branch)
            .ok_or_else(|| Error::Platform(format!("no branch {branch}")))?;

        match target.files.get(path).map(|f| f.sha.clone()) {
            None => Err(Error::NotFound {
                path: path.to_string(),
            }),
            Some(current) if current != prior => Err(Error::RemoteWriteConflict {
                path: path.to_string(),
                detail: format!("expected {current}, got {prior}"),
            }),
            Some(_) => {
                target.files.remove(path);
                target.head = commit;
                Ok(())
            }
        }
    }

    async fn list_files(&self, branch: &str) -> Result<Vec<String>> {
        self.record(Call::ListFiles(branch.to_string()));
        if !self.has_branch(branch) {
            return Err(Error::BaseNotFound(branch.to_string()));
        }
        Ok(self.file_paths(branch))
    }

    async fn create_pr_with_options(
        &self,
        head: &str,
        base: &str,
        title: &str,
        body: Option<&str>,
        draft: bool,
    ) -> Result<PullRequest> {
        self.record(Call::CreatePr {
            head: head.to_string(),
            base: base.to_string(),
            title: title.to_string(),
            body: body.map(ToString::to_string),
            draft,
        });

        // Check for injected error
        if let Some(msg) = self.error_on_create_pr.lock().unwrap().take() {
            return Err(Error::ReviewRequest(msg));
        }

        let number = self.next_pr_number.fetch_add(1, Ordering::SeqCst);
        Ok(PullRequest {
            number,
            html_url: format!("https://github.com/test/repo/pull/{number}"),
            base_ref: base.to_string(),
            head_ref: head.to_string(),
            title: title.to_string(),
            is_draft: draft,
        })
    }

    fn config(&self) -> &PlatformConfig {
        &self.config
    }
}
