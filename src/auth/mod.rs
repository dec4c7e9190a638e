//! Authentication for GitHub and GitLab
//!
//! Supports CLI-based auth (gh, glab) and environment variables. Tokens are
//! resolved once at the edge and handed to the platform service explicitly.

mod github;
mod gitlab;

pub use github::{GitHubAuthConfig, get_github_auth, test_github_auth};
pub use gitlab::{GitLabAuthConfig, get_gitlab_auth, test_gitlab_auth};

use tokio::process::Command;
use tracing::debug;

/// Source of authentication token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthSource {
    /// Token from CLI tool (gh or glab)
    Cli,
    /// Token from environment variable
    EnvVar,
}

impl std::fmt::Display for AuthSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::EnvVar => write!(f, "environment variable"),
        }
    }
}

/// First non-empty value among the given environment variables
fn token_from_env(vars: &[&str]) -> Option<String> {
    vars.iter()
        .filter_map(|name| std::env::var(name).ok())
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

/// Run a CLI helper and return its trimmed stdout, if it succeeded
async fn token_from_cli(program: &str, args: &[&str]) -> Option<String> {
    let output = match Command::new(program).args(args).output().await {
        Ok(output) => output,
        Err(e) => {
            debug!(program, error = %e, "auth helper not available");
            return None;
        }
    };

    if !output.status.success() {
        debug!(program, status = ?output.status, "auth helper failed");
        return None;
    }

    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!token.is_empty()).then_some(token)
}
