//! draftsmith - turn a natural-language task into a reviewable change
//!
//! A completion model proposes a JSON change plan. The plan is extracted
//! from free-form model output, validated, and then executed against a
//! GitHub or GitLab repository: a working branch is created from the base
//! branch, every patch is committed in order, and a review request is
//! opened. Execution is fail-fast and never rolls back.
//!
//! ```text
//! task --> completion --> extract --> validate --> provision --> apply --> review
//! ```

pub mod auth;
pub mod completion;
pub mod config;
pub mod deploy;
pub mod engine;
pub mod error;
pub mod plan;
pub mod platform;
pub mod types;

pub use error::{Error, Result};
