//! Text completion against a hosted large-language-model.
//!
//! Callers depend on the [`TextCompletion`] trait; [`openai::OpenAiClient`]
//! is the production implementation. Failures are surfaced to the caller
//! and never retried here.

pub mod error;
pub mod openai;

use async_trait::async_trait;

pub use error::LlmError;
pub use openai::{LlmConfig, OpenAiClient};

/// Sampling temperature used for coaching feedback.
pub const DEFAULT_TEMPERATURE: f32 = 0.8;

/// Upper bound on generated tokens.
pub const DEFAULT_MAX_TOKENS: u32 = 500;

/// A single system + user prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CompletionRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

/// An opaque text-completion service.
#[async_trait]
pub trait TextCompletion: Send + Sync {
    /// Return the model's reply to `request`.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError>;
}
