//! GitLab authentication

use super::{AuthSource, token_from_cli, token_from_env};
use crate::error::{Error, Result};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

/// Resolved GitLab credentials
#[derive(Debug, Clone)]
pub struct GitLabAuthConfig {
    /// Personal access token
    pub token: String,
    /// Where the token came from
    pub source: AuthSource,
}

/// Resolve a GitLab token from `GITLAB_TOKEN`/`GL_TOKEN` or the glab config
pub async fn get_gitlab_auth(host: Option<&str>) -> Result<GitLabAuthConfig> {
    if let Some(token) = token_from_env(&["GITLAB_TOKEN", "GL_TOKEN"]) {
        debug!("using GitLab token from environment");
        return Ok(GitLabAuthConfig {
            token,
            source: AuthSource::EnvVar,
        });
    }

    let host = host.unwrap_or("gitlab.com");
    token_from_cli("glab", &["config", "get", "token", "--host", host])
        .await
        .map(|token| GitLabAuthConfig {
            token,
            source: AuthSource::Cli,
        })
        .ok_or_else(|| {
            Error::Auth(
                "no GitLab token found; set GITLAB_TOKEN or run `glab auth login`".to_string(),
            )
        })
}

#[derive(Deserialize)]
struct CurrentUser {
    username: String,
}

/// Verify the token works; returns the authenticated username
pub async fn test_gitlab_auth(config: &GitLabAuthConfig, host: Option<&str>) -> Result<String> {
    let host = host.unwrap_or("gitlab.com");
    let user: CurrentUser = Client::new()
        .get(format!("https://{host}/api/v4/user"))
        .header("PRIVATE-TOKEN", &config.token)
        .send()
        .await?
        .error_for_status()
        .map_err(|e| Error::Auth(format!("GitLab rejected the token: {e}")))?
        .json()
        .await?;
    Ok(user.username)
}
