//! GitHub authentication

use super::{AuthSource, token_from_cli, token_from_env};
use crate::error::{Error, Result};
use octocrab::Octocrab;
use tracing::debug;

/// Resolved GitHub credentials
#[derive(Debug, Clone)]
pub struct GitHubAuthConfig {
    /// Personal access token
    pub token: String,
    /// Where the token came from
    pub source: AuthSource,
}

/// Resolve a GitHub token from `GITHUB_TOKEN`/`GH_TOKEN` or `gh auth token`
pub async fn get_github_auth(host: Option<&str>) -> Result<GitHubAuthConfig> {
    if let Some(token) = token_from_env(&["GITHUB_TOKEN", "GH_TOKEN"]) {
        debug!("using GitHub token from environment");
        return Ok(GitHubAuthConfig {
            token,
            source: AuthSource::EnvVar,
        });
    }

    let mut args = vec!["auth", "token"];
    if let Some(h) = host {
        args.extend(["--hostname", h]);
    }

    token_from_cli("gh", &args)
        .await
        .map(|token| GitHubAuthConfig {
            token,
            source: AuthSource::Cli,
        })
        .ok_or_else(|| {
            Error::Auth(
                "no GitHub token found; set GITHUB_TOKEN or run `gh auth login`".to_string(),
            )
        })
}

/// Verify the token works; returns the authenticated login
pub async fn test_github_auth(config: &GitHubAuthConfig, host: Option<&str>) -> Result<String> {
    let mut builder = Octocrab::builder().personal_token(config.token.clone());
    if let Some(h) = host {
        builder = builder
            .base_uri(format!("https://{h}/api/v3"))
            .map_err(|e| Error::Auth(e.to_string()))?;
    }
    let client = builder.build().map_err(|e| Error::Auth(e.to_string()))?;

    let user = client
        .current()
        .user()
        .await
        .map_err(|e| Error::Auth(format!("GitHub rejected the token: {e}")))?;
    Ok(user.login)
}
