//! Generative completion boundary
//!
//! The engine treats the provider as opaque text-in/text-out. Whatever comes
//! back is untrusted and goes through [`crate::plan::parse_plan`].

mod openai;

pub use openai::{OpenAiClient, OpenAiConfig};

use crate::error::Result;
use async_trait::async_trait;

/// A completion request: system instructions plus the user turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    /// System prompt
    pub system: String,
    /// User prompt (task + repository context)
    pub user: String,
}

/// Completion provider trait
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Return the raw text of the model's answer
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}
