//! Repository detection from remote URLs or `owner/repo` shorthands

use crate::error::{Error, Result};
use crate::types::{Platform, PlatformConfig};
use url::Url;

/// Guess the platform from a host name
pub fn detect_platform(host: &str) -> Option<Platform> {
    let host = host.to_lowercase();
    if host == "github.com" || host.contains("github") {
        Some(Platform::GitHub)
    } else if host == "gitlab.com" || host.contains("gitlab") {
        Some(Platform::GitLab)
    } else {
        None
    }
}

/// Parse a repository reference into a platform configuration
///
/// Accepts `owner/repo` (GitHub), HTTPS URLs and SCP-style SSH remotes.
/// GitLab subgroups are folded into `owner` (`group/sub`).
pub fn parse_repo_info(spec: &str) -> Result<PlatformConfig> {
    let spec = spec.trim();
    if spec.is_empty() {
        return Err(Error::Config("repository reference is empty".to_string()));
    }

    let (host, path) = if let Some(rest) = spec.strip_prefix("git@") {
        // git@host:owner/repo.git
        rest.split_once(':')
            .map(|(h, p)| (Some(h.to_string()), p.to_string()))
            .ok_or_else(|| Error::Config(format!("invalid SSH remote: {spec}")))?
    } else if spec.contains("://") {
        let url = Url::parse(spec).map_err(|e| Error::Config(format!("invalid URL {spec}: {e}")))?;
        let host = url
            .host_str()
            .ok_or_else(|| Error::Config(format!("URL has no host: {spec}")))?
            .to_string();
        (Some(host), url.path().to_string())
    } else {
        (None, spec.to_string())
    };

    let path = path.trim_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);
    let (owner, repo) = path
        .rsplit_once('/')
        .filter(|(o, r)| !o.is_empty() && !r.is_empty())
        .ok_or_else(|| Error::Config(format!("expected owner/repo in {spec}")))?;

    let (platform, host) = match host {
        None => (Platform::GitHub, None),
        Some(h) => {
            let platform = detect_platform(&h).ok_or_else(|| {
                Error::Config(format!("cannot detect platform for host {h}; pass --platform"))
            })?;
            let custom = match platform {
                Platform::GitHub if h == "github.com" => None,
                Platform::GitLab if h == "gitlab.com" => None,
                _ => Some(h),
            };
            (platform, custom)
        }
    };

    Ok(PlatformConfig {
        platform,
        owner: owner.to_string(),
        repo: repo.to_string(),
        host,
    })
}
