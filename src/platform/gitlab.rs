//! GitLab platform service implementation

use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::types::{FileWrite, Platform, PlatformConfig, PullRequest, RemoteFileIdentity};
use async_trait::async_trait;
use base64::prelude::{BASE64_STANDARD, Engine as _};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// GitLab service using reqwest
pub struct GitLabService {
    client: Client,
    token: String,
    api_base: String,
    config: PlatformConfig,
    project_path: String,
}

#[derive(Deserialize)]
struct MergeRequest {
    iid: u64,
    web_url: String,
    source_branch: String,
    target_branch: String,
    title: String,
    #[serde(default)]
    draft: bool,
}

impl From<MergeRequest> for PullRequest {
    fn from(mr: MergeRequest) -> Self {
        Self {
            number: mr.iid,
            html_url: mr.web_url,
            base_ref: mr.target_branch,
            head_ref: mr.source_branch,
            title: mr.title,
            is_draft: mr.draft,
        }
    }
}

#[derive(Serialize)]
struct CreateMrPayload<'a> {
    source_branch: &'a str,
    target_branch: &'a str,
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    draft: Option<bool>,
}

#[derive(Deserialize)]
struct Branch {
    commit: BranchCommit,
}

#[derive(Deserialize)]
struct BranchCommit {
    id: String,
}

#[derive(Deserialize)]
struct RepositoryFile {
    blob_id: String,
    last_commit_id: String,
    #[serde(default)]
    content: String,
}

#[derive(Serialize)]
struct WriteFilePayload<'a> {
    branch: &'a str,
    content: &'a str,
    encoding: &'static str,
    commit_message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_commit_id: Option<&'a str>,
}

#[derive(Serialize)]
struct DeleteFilePayload<'a> {
    branch: &'a str,
    commit_message: &'a str,
    last_commit_id: &'a str,
}

#[derive(Deserialize)]
struct TreeEntry {
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Page size for paginated listings
const PER_PAGE: &str = "100";

impl GitLabService {
    /// Create a new GitLab service
    pub fn new(token: String, owner: String, repo: String, host: Option<String>) -> Result<Self> {
        let host = host.unwrap_or_else(|| "gitlab.com".to_string());
        let api_base = format!("https://{host}/api/v4");
        let config_host = if host == "gitlab.com" { None } else { Some(host) };
        Self::build(token, owner, repo, config_host, api_base)
    }

    /// Create a service against an explicit API base URL (e.g. `http://127.0.0.1:1234/api/v4`)
    pub fn with_api_base(token: String, owner: String, repo: String, api_base: &str) -> Result<Self> {
        Self::build(
            token,
            owner,
            repo,
            None,
            api_base.trim_end_matches('/').to_string(),
        )
    }

    fn build(
        token: String,
        owner: String,
        repo: String,
        host: Option<String>,
        api_base: String,
    ) -> Result<Self> {
        let project_path = format!("{owner}/{repo}");

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::GitLabApi(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            token,
            api_base,
            config: PlatformConfig {
                platform: Platform::GitLab,
                owner,
                repo,
                host,
            },
            project_path,
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    fn encoded_project(&self) -> String {
        urlencoding::encode(&self.project_path).into_owned()
    }

    fn file_url(&self, path: &str) -> String {
        self.api_url(&format!(
            "/projects/{}/repository/files/{}",
            self.encoded_project(),
            urlencoding::encode(path)
        ))
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("PRIVATE-TOKEN", &self.token)
    }

    async fn get_file(&self, branch: &str, path: &str) -> Result<Option<RepositoryFile>> {
        let response = self
            .authed(self.client.get(self.file_url(path)))
            .query(&[("ref", branch)])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let file: RepositoryFile = response
            .error_for_status()
            .map_err(|e| Error::GitLabApi(e.to_string()))?
            .json()
            .await?;
        Ok(Some(file))
    }
}

/// Status plus body of a failed response, for error messages
async fn failure_text(response: Response) -> (StatusCode, String) {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<unable to read response>".to_string());
    (status, body)
}

/// Whether a failed file write or delete was rejected for stale state
///
/// GitLab answers 400 both for stale `last_commit_id` and for plain
/// validation errors, so only the body tells them apart.
fn is_write_conflict(status: StatusCode, body: &str) -> bool {
    status == StatusCode::CONFLICT
        || (status == StatusCode::BAD_REQUEST
            && (body.contains("already exists") || body.contains("has changed since")))
}

#[async_trait]
impl PlatformService for GitLabService {
    async fn branch_head(&self, branch: &str) -> Result<Option<String>> {
        debug!(branch, "resolving branch head");
        let url = self.api_url(&format!(
            "/projects/{}/repository/branches/{}",
            self.encoded_project(),
            urlencoding::encode(branch)
        ));

        let response = self.authed(self.client.get(&url)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!(branch, "branch not found");
            return Ok(None);
        }

        let found: Branch = response
            .error_for_status()
            .map_err(|e| Error::GitLabApi(e.to_string()))?
            .json()
            .await?;

        debug!(branch, sha = %found.commit.id, "resolved branch head");
        Ok(Some(found.commit.id))
    }

    async fn create_branch(&self, name: &str, sha: &str) -> Result<()> {
        debug!(name, sha, "creating branch");
        let url = self.api_url(&format!(
            "/projects/{}/repository/branches",
            self.encoded_project()
        ));

        let response = self
            .authed(self.client.post(&url))
            .query(&[("branch", name), ("ref", sha)])
            .send()
            .await?;

        if response.status().is_success() {
            debug!(name, "created branch");
            return Ok(());
        }

        let (status, body) = failure_text(response).await;
        if status == StatusCode::BAD_REQUEST && body.contains("already exists") {
            return Err(Error::BranchExists(name.to_string()));
        }
        Err(Error::GitLabApi(format!("create branch responded with {status}: {body}")))
    }

    async fn file_identity(&self, branch: &str, path: &str) -> Result<RemoteFileIdentity> {
        debug!(branch, path, "looking up file identity");
        let identity = match self.get_file(branch, path).await? {
            Some(file) => RemoteFileIdentity {
                path: path.to_string(),
                blob_sha: Some(file.blob_id),
                write_token: Some(file.last_commit_id),
            },
            None => RemoteFileIdentity::absent(path),
        };
        debug!(path, exists = identity.exists(), "looked up file identity");
        Ok(identity)
    }

    async fn read_file(&self, branch: &str, path: &str) -> Result<Option<String>> {
        debug!(branch, path, "reading file");
        let Some(file) = self.get_file(branch, path).await? else {
            return Ok(None);
        };

        let bytes = BASE64_STANDARD
            .decode(file.content.trim())
            .map_err(|e| Error::GitLabApi(format!("invalid base64 content: {e}")))?;
        Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
    }

    async fn write_file(&self, write: &FileWrite<'_>) -> Result<Option<String>> {
        debug!(branch = write.branch, path = write.path, update = write.prior.is_some(), "writing file");
        let url = self.file_url(write.path);
        let payload = WriteFilePayload {
            branch: write.branch,
            content: &write.encoded_content,
            encoding: "base64",
            commit_message: &write.message,
            last_commit_id: write.prior,
        };

        // GitLab distinguishes create (POST) from update (PUT)
        let request = if write.prior.is_some() {
            self.client.put(&url)
        } else {
            self.client.post(&url)
        };

        let response = self.authed(request).json(&payload).send().await?;
        if response.status().is_success() {
            debug!(path = write.path, "wrote file");
            // GitLab does not report the new blob id on writes
            return Ok(None);
        }

        let (status, body) = failure_text(response).await;
        if is_write_conflict(status, &body) {
            return Err(Error::RemoteWriteConflict {
                path: write.path.to_string(),
                detail: body,
            });
        }
        Err(Error::GitLabApi(format!("write file responded with {status}: {body}")))
    }

    async fn delete_file(
        &self,
        branch: &str,
        path: &str,
        prior: &str,
        message: &str,
    ) -> Result<()> {
        debug!(branch, path, "deleting file");
        let payload = DeleteFilePayload {
            branch,
            commit_message: message,
            last_commit_id: prior,
        };

        let response = self
            .authed(self.client.delete(self.file_url(path)))
            .json(&payload)
            .send()
            .await?;

        if response.status().is_success() {
            debug!(path, "deleted file");
            return Ok(());
        }

        let (status, body) = failure_text(response).await;
        match status {
            StatusCode::NOT_FOUND => Err(Error::NotFound {
                path: path.to_string(),
            }),
            _ if is_write_conflict(status, &body) => Err(Error::RemoteWriteConflict {
                path: path.to_string(),
                detail: body,
            }),
            _ => Err(Error::GitLabApi(format!("delete file responded with {status}: {body}"))),
        }
    }

    async fn list_files(&self, branch: &str) -> Result<Vec<String>> {
        debug!(branch, "listing files");
        let url = self.api_url(&format!(
            "/projects/{}/repository/tree",
            self.encoded_project()
        ));

        let mut files = Vec::new();
        let mut page = "1".to_string();
        loop {
            let response = self
                .authed(self.client.get(&url))
                .query(&[
                    ("ref", branch),
                    ("recursive", "true"),
                    ("per_page", PER_PAGE),
                    ("page", page.as_str()),
                ])
                .send()
                .await?;

            if response.status() == StatusCode::NOT_FOUND {
                return Err(Error::BaseNotFound(branch.to_string()));
            }

            let response = response
                .error_for_status()
                .map_err(|e| Error::GitLabApi(e.to_string()))?;

            let next_page = response
                .headers()
                .get("x-next-page")
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(ToString::to_string);

            let entries: Vec<TreeEntry> = response.json().await?;
            files.extend(
                entries
                    .into_iter()
                    .filter(|entry| entry.kind == "blob")
                    .map(|entry| entry.path),
            );

            match next_page {
                Some(next) => page = next,
                None => break,
            }
        }

        debug!(branch, count = files.len(), "listed files");
        Ok(files)
    }

    async fn create_pr_with_options(
        &self,
        head: &str,
        base: &str,
        title: &str,
        body: Option<&str>,
        draft: bool,
    ) -> Result<PullRequest> {
        debug!(head, base, draft, "creating MR");
        let url = self.api_url(&format!(
            "/projects/{}/merge_requests",
            self.encoded_project()
        ));

        let payload = CreateMrPayload {
            source_branch: head,
            target_branch: base,
            title,
            description: body,
            draft: if draft { Some(true) } else { None },
        };

        let response = self
            .authed(self.client.post(&url))
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::ReviewRequest(e.to_string()))?;

        if !response.status().is_success() {
            let (status, body) = failure_text(response).await;
            return Err(Error::ReviewRequest(format!("GitLab responded with {status}: {body}")));
        }

        let mr: MergeRequest = response
            .json()
            .await
            .map_err(|e| Error::ReviewRequest(format!("failed to parse MR response: {e}")))?;

        let pr: PullRequest = mr.into();
        debug!(mr_iid = pr.number, "created MR");
        Ok(pr)
    }

    fn config(&self) -> &PlatformConfig {
        &self.config
    }
}
