//! User configuration in `$CONFIG_DIR/draftsmith/config.toml`
//!
//! Every key is optional. A handful of environment variables override the
//! file; secrets (API keys, host tokens) are never read from it.

use crate::completion::OpenAiConfig;
use crate::engine::{BranchNaming, EngineOptions, NamingStyle, ReviewOptions};
use crate::error::{Error, Result};
use crate::types::Platform;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory name under the platform config dir
const APP_DIR: &str = "draftsmith";

/// Config file name
const CONFIG_FILE: &str = "config.toml";

/// Environment variables that override file values
pub const ENV_MODEL: &str = "OPENAI_MODEL";
/// Overrides `model.api_base`
pub const ENV_API_BASE: &str = "OPENAI_BASE_URL";
/// Overrides `repository.base`
pub const ENV_BASE_BRANCH: &str = "DRAFTSMITH_BASE_BRANCH";
/// Overrides `deploy.hook_url`
pub const ENV_DEPLOY_HOOK: &str = "VERCEL_DEPLOY_HOOK_URL";

/// Target repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// Explicit platform; detected from the host when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
    /// Owner or group path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// Repository name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    /// Self-hosted host name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Base branch for working branches and reviews
    pub base: String,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            platform: None,
            owner: None,
            repo: None,
            host: None,
            base: "main".to_string(),
        }
    }
}

/// Working branch naming
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BranchConfig {
    /// Prefix for generated branch names
    pub prefix: String,
    /// Suffix style
    pub naming: NamingStyle,
}

impl Default for BranchConfig {
    fn default() -> Self {
        Self {
            prefix: "ai/".to_string(),
            naming: NamingStyle::Timestamp,
        }
    }
}

/// Review request defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    /// PR/MR title
    pub title: String,
    /// Open reviews as drafts
    pub draft: bool,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        let defaults = ReviewOptions::default();
        Self {
            title: defaults.title,
            draft: defaults.draft,
        }
    }
}

/// Completion provider settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Model name
    pub model: String,
    /// OpenAI-compatible API base URL
    pub api_base: String,
    /// Sampling temperature
    pub temperature: f64,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            api_base: "https://api.openai.com/v1".to_string(),
            temperature: 0.2,
            timeout_secs: 90,
        }
    }
}

/// Repository context sent with a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Maximum number of tree paths included in a prompt
    pub tree_limit: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self { tree_limit: 500 }
    }
}

/// Preview deployment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    /// Deploy hook URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hook_url: Option<String>,
}

/// Full configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Target repository
    pub repository: RepositoryConfig,
    /// Branch naming
    pub branch: BranchConfig,
    /// Review request defaults
    pub review: ReviewConfig,
    /// Completion provider
    pub model: ModelConfig,
    /// Prompt context
    pub context: ContextConfig,
    /// Deploy hook
    pub deploy: DeployConfig,
}

/// Default config file location, `None` if the platform has no config dir
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

impl AppConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("invalid config: {e}")))
    }

    /// Load configuration from `path`
    ///
    /// Returns defaults if the file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse {}: {e}", path.display())))
    }

    /// Load the default config file, then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = match config_path() {
            Some(path) => Self::load_from(&path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply overrides from an environment lookup
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(model) = get(ENV_MODEL) {
            self.model.model = model;
        }
        if let Some(api_base) = get(ENV_API_BASE) {
            self.model.api_base = api_base;
        }
        if let Some(base) = get(ENV_BASE_BRANCH) {
            self.repository.base = base;
        }
        if let Some(url) = get(ENV_DEPLOY_HOOK) {
            self.deploy.hook_url = Some(url);
        }
    }

    /// Engine options, optionally overriding the base branch
    pub fn engine_options(&self, base_override: Option<&str>) -> EngineOptions {
        EngineOptions {
            base_branch: base_override.map_or_else(|| self.repository.base.clone(), String::from),
            naming: BranchNaming {
                prefix: self.branch.prefix.clone(),
                style: self.branch.naming,
            },
            review: ReviewOptions {
                title: self.review.title.clone(),
                draft: self.review.draft,
            },
        }
    }

    /// Completion client settings for `api_key`
    pub fn openai_config(&self, api_key: String) -> OpenAiConfig {
        OpenAiConfig {
            api_key,
            model: self.model.model.clone(),
            api_base: self.model.api_base.clone(),
            temperature: self.model.temperature,
            timeout: Duration::from_secs(self.model.timeout_secs),
        }
    }

    /// `owner/repo` from the config file, if both are set
    pub fn repository_spec(&self) -> Option<String> {
        match (&self.repository.owner, &self.repository.repo) {
            (Some(owner), Some(repo)) => Some(format!("{owner}/{repo}")),
            _ => None,
        }
    }

    /// Render as TOML with the deploy hook masked
    pub fn to_display_toml(&self) -> Result<String> {
        let mut shown = self.clone();
        if let Some(url) = shown.deploy.hook_url.as_mut() {
            *url = mask_secret(url);
        }
        toml::to_string_pretty(&shown)
            .map_err(|e| Error::Config(format!("failed to serialize config: {e}")))
    }
}

/// Keep the first few characters of a secret and hide the rest
pub fn mask_secret(secret: &str) -> String {
    const VISIBLE: usize = 8;
    if secret.chars().count() <= VISIBLE {
        return "********".to_string();
    }
    let head: String = secret.chars().take(VISIBLE).collect();
    format!("{head}********")
}
