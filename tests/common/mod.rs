//! Shared test fixtures

#![allow(dead_code)]

pub mod mock_platform;

pub use mock_platform::{BASE_SHA, Call, MockPlatformService};

use async_trait::async_trait;
use draftsmith::completion::{CompletionRequest, CompletionService};
use draftsmith::error::{Error, Result};
use draftsmith::types::{ChangePlan, Patch, Platform, PlatformConfig};
use std::sync::Mutex;

/// GitHub config for `test/repo`
pub fn github_config() -> PlatformConfig {
    PlatformConfig {
        platform: Platform::GitHub,
        owner: "test".to_string(),
        repo: "repo".to_string(),
        host: None,
    }
}

/// Build a plan from patches
pub fn make_plan(summary: &str, patches: Vec<Patch>) -> ChangePlan {
    ChangePlan {
        summary: summary.to_string(),
        patches,
    }
}

/// Completion provider answering with canned text
pub struct StubCompletion {
    answer: std::result::Result<String, String>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl StubCompletion {
    /// Always answer `text`
    pub fn answering(text: &str) -> Self {
        Self {
            answer: Ok(text.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Always fail with a completion error
    pub fn failing(msg: &str) -> Self {
        Self {
            answer: Err(msg.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionService for StubCompletion {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        self.answer.clone().map_err(Error::Completion)
    }
}
