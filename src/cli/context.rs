//! Shared command context for CLI commands
//!
//! Resolves configuration, the target repository, credentials and the
//! platform service once, for every command that talks to the remote.

use draftsmith::auth::{get_github_auth, get_gitlab_auth};
use draftsmith::completion::OpenAiClient;
use draftsmith::config::AppConfig;
use draftsmith::error::{Error, Result};
use draftsmith::platform::{PlatformService, create_platform_service, parse_repo_info};
use draftsmith::types::{Platform, PlatformConfig};
use tracing::debug;

/// Environment variable holding the completion API key
const OPENAI_API_KEY: &str = "OPENAI_API_KEY";

/// Repository selection from global flags
#[derive(Debug, Clone, Default)]
pub struct RepoArgs {
    /// `owner/repo` or remote URL
    pub repo: Option<String>,
    /// Explicit platform
    pub platform: Option<Platform>,
    /// Self-hosted host name
    pub host: Option<String>,
}

/// Resolve the target repository from flags, then the config file
///
/// Flags win over config values field by field.
pub fn resolve_repository(args: &RepoArgs, config: &AppConfig) -> Result<PlatformConfig> {
    let spec = args
        .repo
        .clone()
        .or_else(|| config.repository_spec())
        .ok_or_else(|| {
            Error::Config(
                "no repository given; pass --repo owner/repo or set [repository] in config"
                    .to_string(),
            )
        })?;

    let mut resolved = parse_repo_info(&spec)?;
    if let Some(platform) = args.platform.or(config.repository.platform) {
        resolved.platform = platform;
    }
    if let Some(host) = args.host.clone().or_else(|| config.repository.host.clone()) {
        resolved.host = Some(host);
    }
    Ok(resolved)
}

/// Host token for the resolved platform
pub async fn resolve_token(repository: &PlatformConfig) -> Result<String> {
    let host = repository.host.as_deref();
    match repository.platform {
        Platform::GitHub => Ok(get_github_auth(host).await?.token),
        Platform::GitLab => Ok(get_gitlab_auth(host).await?.token),
    }
}

/// Shared context for CLI commands that interact with the platform
pub struct CommandContext {
    /// Loaded configuration
    pub config: AppConfig,
    /// Resolved repository
    pub repository: PlatformConfig,
    /// Platform service (GitHub/GitLab)
    pub platform: Box<dyn PlatformService>,
}

impl CommandContext {
    /// Load config, resolve the repository and authenticate
    pub async fn new(args: &RepoArgs) -> Result<Self> {
        let config = AppConfig::load()?;
        let repository = resolve_repository(args, &config)?;
        debug!(
            platform = %repository.platform,
            owner = %repository.owner,
            repo = %repository.repo,
            "resolved repository"
        );

        let token = resolve_token(&repository).await?;
        let platform = create_platform_service(&repository, &token)?;

        Ok(Self {
            config,
            repository,
            platform,
        })
    }

    /// Base branch, preferring an explicit override
    pub fn base_branch(&self, base_override: Option<&str>) -> String {
        base_override.map_or_else(|| self.config.repository.base.clone(), String::from)
    }

    /// Completion client configured from `[model]` and `OPENAI_API_KEY`
    pub fn completion_client(&self) -> Result<OpenAiClient> {
        let api_key = std::env::var(OPENAI_API_KEY)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::Config(format!("{OPENAI_API_KEY} is not set")))?;
        OpenAiClient::new(self.config.openai_config(api_key))
    }

    /// Display name like `GitHub acme/web`
    pub fn repository_label(&self) -> String {
        format!(
            "{} {}/{}",
            self.repository.platform, self.repository.owner, self.repository.repo
        )
    }
}
