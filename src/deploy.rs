//! Preview deployment via a deploy hook URL

use crate::error::{Error, Result};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// Deploy hook request timeout
const DEPLOY_TIMEOUT_SECS: u64 = 30;

/// What the deploy hook answered
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeployResponse {
    /// Whether the hook answered with a 2xx status
    pub ok: bool,
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub text: String,
}

/// POST to the configured deploy hook
///
/// A non-2xx answer is reported through [`DeployResponse::ok`]; only a
/// missing URL or a transport failure is an error.
pub async fn trigger_hook(hook_url: Option<&str>) -> Result<DeployResponse> {
    let url = hook_url
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| Error::Config("deploy hook URL is not configured".to_string()))?;

    let client = Client::builder()
        .timeout(Duration::from_secs(DEPLOY_TIMEOUT_SECS))
        .build()
        .map_err(|e| Error::Deploy(format!("failed to create HTTP client: {e}")))?;

    debug!("triggering deploy hook");
    let response = client
        .post(url)
        .send()
        .await
        .map_err(|e| Error::Deploy(e.to_string()))?;

    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| Error::Deploy(format!("failed to read deploy response: {e}")))?;
    debug!(status = status.as_u16(), "deploy hook answered");

    Ok(DeployResponse {
        ok: status.is_success(),
        status: status.as_u16(),
        text,
    })
}
