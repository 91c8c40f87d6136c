//! Completion provider trait, the abstraction over LLM backends.
//!
//! A completion provider takes a model identifier and a fully rendered
//! prompt and returns the generated text in one piece.
//!
//! Implementations: OpenAI-compatible endpoints, Snowflake Cortex.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CompletionError;

/// A single completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// The model to use (e.g., "mistral-large2", "claude-3-5-sonnet")
    pub model: String,

    /// The full prompt text
    pub prompt: String,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
        }
    }
}

/// A complete response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// The generated text
    pub text: String,

    /// Which model actually responded (may differ from requested)
    pub model: String,

    /// Token usage statistics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// Token usage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// The core completion trait.
///
/// The conversation controller calls `complete()` without knowing which
/// backend is behind it.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// A human-readable name for this provider (e.g., "openai", "cortex").
    fn name(&self) -> &str;

    /// Send a prompt and get the complete generated text.
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<CompletionResponse, CompletionError>;

    /// Health check: can we reach the provider?
    async fn health_check(&self) -> std::result::Result<bool, CompletionError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_constructor() {
        let req = CompletionRequest::new("mistral-large2", "[INST] hi [/INST]");
        assert_eq!(req.model, "mistral-large2");
        assert!(req.prompt.starts_with("[INST]"));
    }

    #[test]
    fn response_without_usage_skips_field() {
        let resp = CompletionResponse {
            text: "ok".into(),
            model: "llama3.1-70b".into(),
            usage: None,
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(!json.contains("usage"));
    }
}
