//! Auth command - check host credentials

use crate::cli::context::{RepoArgs, resolve_repository};
use crate::cli::style::{Stylize, check};
use anstream::println;
use draftsmith::auth::{get_github_auth, get_gitlab_auth, test_github_auth, test_gitlab_auth};
use draftsmith::config::AppConfig;
use draftsmith::error::Result;
use draftsmith::types::Platform;

/// Run `auth test` for the platform of the resolved repository
///
/// Without a repository, falls back to `--platform` (GitHub by default).
pub async fn run_auth_test(repo: &RepoArgs) -> Result<()> {
    let config = AppConfig::load()?;
    let (platform, host) = match resolve_repository(repo, &config) {
        Ok(resolved) => (resolved.platform, resolved.host),
        Err(_) => (
            repo.platform.unwrap_or(Platform::GitHub),
            repo.host.clone(),
        ),
    };
    let host = host.as_deref();

    let (login, source) = match platform {
        Platform::GitHub => {
            let auth = get_github_auth(host).await?;
            (test_github_auth(&auth, host).await?, auth.source)
        }
        Platform::GitLab => {
            let auth = get_gitlab_auth(host).await?;
            (test_gitlab_auth(&auth, host).await?, auth.source)
        }
    };

    println!(
        "{} {} authenticated as {} {}",
        check(),
        platform.emphasis(),
        login.accent(),
        format!("(token from {source})").muted()
    );
    Ok(())
}
