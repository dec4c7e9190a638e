//! Working branch provisioning

use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::types::{ChangePlan, WorkingBranch};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

/// Longest summary slug kept in a branch name
const MAX_SLUG_LEN: usize = 40;

/// Hex digits of random suffix appended to every branch name
const NONCE_LEN: usize = 8;

/// How the unique part of a working branch name is derived
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamingStyle {
    /// `{prefix}{unix_millis}-{nonce}`
    #[default]
    Timestamp,
    /// `{prefix}{summary-slug}-{unix_millis}-{nonce}`
    Summary,
}

/// Working branch naming strategy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchNaming {
    /// Prefix such as `ai/`
    pub prefix: String,
    /// Suffix style
    pub style: NamingStyle,
}

impl Default for BranchNaming {
    fn default() -> Self {
        Self {
            prefix: "ai/".to_string(),
            style: NamingStyle::Timestamp,
        }
    }
}

impl BranchNaming {
    /// Derive a fresh branch name for `plan` at time `now`
    ///
    /// A random suffix keeps names distinct between runs started in the
    /// same millisecond or sharing a summary.
    pub fn branch_name(&self, plan: &ChangePlan, now: DateTime<Utc>) -> String {
        self.format_name(plan, now, &nonce())
    }

    fn format_name(&self, plan: &ChangePlan, now: DateTime<Utc>, nonce: &str) -> String {
        let millis = now.timestamp_millis();
        match self.style {
            NamingStyle::Timestamp => format!("{}{millis}-{nonce}", self.prefix),
            NamingStyle::Summary => {
                format!("{}{}-{millis}-{nonce}", self.prefix, slugify(&plan.summary))
            }
        }
    }
}

fn nonce() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(NONCE_LEN);
    id
}

fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut prev_dash = true;
    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            prev_dash = false;
        } else if !prev_dash {
            slug.push('-');
            prev_dash = true;
        }
        if slug.len() >= MAX_SLUG_LEN {
            break;
        }
    }

    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "change".to_string()
    } else {
        slug.to_string()
    }
}

/// Create a working branch at the base branch's current head
///
/// Reads the base head and creates one ref; nothing else touches the remote.
pub async fn provision_branch(
    platform: &dyn PlatformService,
    base: &str,
    naming: &BranchNaming,
    plan: &ChangePlan,
) -> Result<WorkingBranch> {
    let base_sha = platform
        .branch_head(base)
        .await?
        .ok_or_else(|| Error::BaseNotFound(base.to_string()))?;

    let name = naming.branch_name(plan, Utc::now());
    debug!(base, %base_sha, name, "provisioning working branch");
    platform.create_branch(&name, &base_sha).await?;

    info!(name, base, "working branch created");
    Ok(WorkingBranch {
        name,
        base: base.to_string(),
        base_sha,
    })
}
