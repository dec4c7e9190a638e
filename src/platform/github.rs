//! GitHub platform service implementation

use crate::error::{Error, Result};
use crate::platform::{PlatformService, encode_path_segments};
use crate::types::{FileWrite, Platform, PlatformConfig, PullRequest, RemoteFileIdentity};
use async_trait::async_trait;
use base64::prelude::{BASE64_STANDARD, Engine as _};
use octocrab::Octocrab;
use serde::{Deserialize, Serialize};
use tracing::debug;

// REST payloads for the git data and contents endpoints

#[derive(Deserialize)]
struct GitRef {
    object: GitObject,
}

#[derive(Deserialize)]
struct GitObject {
    sha: String,
}

#[derive(Serialize)]
struct CreateRefBody<'a> {
    #[serde(rename = "ref")]
    git_ref: String,
    sha: &'a str,
}

#[derive(Serialize)]
struct RefQuery<'a> {
    #[serde(rename = "ref")]
    git_ref: &'a str,
}

#[derive(Deserialize)]
struct ContentFile {
    sha: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Serialize)]
struct PutContentBody<'a> {
    message: &'a str,
    content: &'a str,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Deserialize)]
struct PutContentResponse {
    content: Option<ContentRef>,
}

#[derive(Deserialize)]
struct ContentRef {
    sha: String,
}

#[derive(Serialize)]
struct DeleteContentBody<'a> {
    message: &'a str,
    sha: &'a str,
    branch: &'a str,
}

#[derive(Serialize)]
struct TreeQuery {
    recursive: u8,
}

#[derive(Deserialize)]
struct Tree {
    tree: Vec<TreeEntry>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Deserialize)]
struct TreeEntry {
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

/// GitHub service using octocrab
pub struct GitHubService {
    client: Octocrab,
    config: PlatformConfig,
}

impl GitHubService {
    /// Create a new GitHub service
    pub fn new(token: &str, owner: String, repo: String, host: Option<String>) -> Result<Self> {
        let base_uri = host.as_ref().map(|h| format!("https://{h}/api/v3"));
        Self::build(token, owner, repo, host, base_uri.as_deref())
    }

    /// Create a service against an explicit API base URI
    pub fn with_base_uri(token: &str, owner: String, repo: String, base_uri: &str) -> Result<Self> {
        Self::build(token, owner, repo, None, Some(base_uri))
    }

    fn build(
        token: &str,
        owner: String,
        repo: String,
        host: Option<String>,
        base_uri: Option<&str>,
    ) -> Result<Self> {
        let mut builder = Octocrab::builder().personal_token(token.to_string());

        if let Some(uri) = base_uri {
            builder = builder
                .base_uri(uri)
                .map_err(|e| Error::GitHubApi(e.to_string()))?;
        }

        let client = builder
            .build()
            .map_err(|e| Error::GitHubApi(e.to_string()))?;

        Ok(Self {
            client,
            config: PlatformConfig {
                platform: Platform::GitHub,
                owner,
                repo,
                host,
            },
        })
    }

    fn repo_route(&self, rest: &str) -> String {
        format!("/repos/{}/{}/{rest}", self.config.owner, self.config.repo)
    }

    fn contents_route(&self, path: &str) -> String {
        self.repo_route(&format!("contents/{}", encode_path_segments(path)))
    }

    async fn get_content(&self, branch: &str, path: &str) -> Result<Option<ContentFile>> {
        let query = RefQuery { git_ref: branch };
        match self
            .client
            .get::<ContentFile, _, _>(self.contents_route(path), Some(&query))
            .await
        {
            Ok(file) => Ok(Some(file)),
            Err(e) if status_of(&e) == Some(404) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// HTTP status carried by an octocrab error, if the API answered at all
fn status_of(err: &octocrab::Error) -> Option<u16> {
    match err {
        octocrab::Error::GitHub { source, .. } => Some(source.status_code.as_u16()),
        _ => None,
    }
}

fn message_of(err: &octocrab::Error) -> String {
    match err {
        octocrab::Error::GitHub { source, .. } => source.message.clone(),
        other => other.to_string(),
    }
}

/// Decode the base64 transport content GitHub returns (wrapped at 60 columns)
pub(crate) fn decode_content(encoded: &str) -> Result<String> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = BASE64_STANDARD
        .decode(compact)
        .map_err(|e| Error::GitHubApi(format!("invalid base64 content: {e}")))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Helper to convert octocrab PR to our `PullRequest` type
fn pr_from_octocrab(pr: &octocrab::models::pulls::PullRequest) -> PullRequest {
    PullRequest {
        number: pr.number,
        html_url: pr
            .html_url
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default(),
        base_ref: pr.base.ref_field.clone(),
        head_ref: pr.head.ref_field.clone(),
        title: pr.title.as_deref().unwrap_or_default().to_string(),
        is_draft: pr.draft.unwrap_or(false),
    }
}

#[async_trait]
impl PlatformService for GitHubService {
    async fn branch_head(&self, branch: &str) -> Result<Option<String>> {
        debug!(branch, "resolving branch head");
        let route = self.repo_route(&format!("git/ref/heads/{}", encode_path_segments(branch)));

        match self.client.get::<GitRef, _, ()>(route, None).await {
            Ok(git_ref) => {
                debug!(branch, sha = %git_ref.object.sha, "resolved branch head");
                Ok(Some(git_ref.object.sha))
            }
            Err(e) if status_of(&e) == Some(404) => {
                debug!(branch, "branch not found");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn create_branch(&self, name: &str, sha: &str) -> Result<()> {
        debug!(name, sha, "creating branch");
        let body = CreateRefBody {
            git_ref: format!("refs/heads/{name}"),
            sha,
        };

        match self
            .client
            .post::<_, serde_json::Value>(self.repo_route("git/refs"), Some(&body))
            .await
        {
            Ok(_) => {
                debug!(name, "created branch");
                Ok(())
            }
            // 422 also covers invalid ref names and unknown SHAs
            Err(e)
                if matches!(status_of(&e), Some(409 | 422))
                    && message_of(&e).contains("already exists") =>
            {
                Err(Error::BranchExists(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn file_identity(&self, branch: &str, path: &str) -> Result<RemoteFileIdentity> {
        debug!(branch, path, "looking up file identity");
        let identity = match self.get_content(branch, path).await? {
            Some(file) => RemoteFileIdentity::present(path, file.sha),
            None => RemoteFileIdentity::absent(path),
        };
        debug!(path, exists = identity.exists(), "looked up file identity");
        Ok(identity)
    }

    async fn read_file(&self, branch: &str, path: &str) -> Result<Option<String>> {
        debug!(branch, path, "reading file");
        self.get_content(branch, path)
            .await?
            .map(|file| decode_content(file.content.as_deref().unwrap_or_default()))
            .transpose()
    }

    async fn write_file(&self, write: &FileWrite<'_>) -> Result<Option<String>> {
        debug!(branch = write.branch, path = write.path, update = write.prior.is_some(), "writing file");
        let body = PutContentBody {
            message: &write.message,
            content: &write.encoded_content,
            branch: write.branch,
            sha: write.prior,
        };

        match self
            .client
            .put::<PutContentResponse, _, _>(self.contents_route(write.path), Some(&body))
            .await
        {
            Ok(response) => {
                let sha = response.content.map(|c| c.sha);
                debug!(path = write.path, sha = ?sha, "wrote file");
                Ok(sha)
            }
            // 409: sha does not match; 422: sha missing for an existing file
            Err(e) if matches!(status_of(&e), Some(409 | 422)) => Err(Error::RemoteWriteConflict {
                path: write.path.to_string(),
                detail: message_of(&e),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_file(
        &self,
        branch: &str,
        path: &str,
        prior: &str,
        message: &str,
    ) -> Result<()> {
        debug!(branch, path, "deleting file");
        let body = DeleteContentBody {
            message,
            sha: prior,
            branch,
        };

        match self
            .client
            .delete::<serde_json::Value, _, _>(self.contents_route(path), Some(&body))
            .await
        {
            Ok(_) => {
                debug!(path, "deleted file");
                Ok(())
            }
            Err(e) if status_of(&e) == Some(404) => Err(Error::NotFound {
                path: path.to_string(),
            }),
            Err(e) if matches!(status_of(&e), Some(409 | 422)) => Err(Error::RemoteWriteConflict {
                path: path.to_string(),
                detail: message_of(&e),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_files(&self, branch: &str) -> Result<Vec<String>> {
        debug!(branch, "listing files");
        let sha = self
            .branch_head(branch)
            .await?
            .ok_or_else(|| Error::BaseNotFound(branch.to_string()))?;

        let tree: Tree = self
            .client
            .get(
                self.repo_route(&format!("git/trees/{sha}")),
                Some(&TreeQuery { recursive: 1 }),
            )
            .await?;

        if tree.truncated {
            debug!(branch, "tree listing truncated by GitHub");
        }

        let files: Vec<String> = tree
            .tree
            .into_iter()
            .filter(|entry| entry.kind == "blob")
            .map(|entry| entry.path)
            .collect();
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
        debug!(head, base, draft, "creating PR");
        let pulls = self.client.pulls(&self.config.owner, &self.config.repo);
        let mut builder = pulls.create(title, head, base).draft(draft);

        if let Some(body_text) = body {
            builder = builder.body(body_text);
        }

        let pr = builder
            .send()
            .await
            .map_err(|e| Error::ReviewRequest(message_of(&e)))?;

        let result = pr_from_octocrab(&pr);
        debug!(pr_number = result.number, "created PR");
        Ok(result)
    }

    fn config(&self) -> &PlatformConfig {
        &self.config
    }
}
