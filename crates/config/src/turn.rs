//! Per-turn options chosen in the presentation layer.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

pub const MIN_CHAT_MESSAGES: usize = 1;
pub const MAX_CHAT_MESSAGES: usize = 10;
pub const MIN_RETRIEVED_CHUNKS: usize = 1;
pub const MAX_RETRIEVED_CHUNKS: usize = 10;

/// Snapshot of the user-selected options, read once at the start of a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnConfig {
    /// Search service to query
    pub service: String,

    /// Model for both reformulation and answering
    pub model: String,

    /// Size of the chat-history window
    pub num_chat_messages: usize,

    /// Result limit passed to the search service
    pub num_retrieved_chunks: usize,

    /// Reformulate follow-ups and show history to the model
    pub use_chat_history: bool,

    /// Publish retrieved context and reformulated queries
    pub debug: bool,
}

impl TurnConfig {
    /// Check ranges and that `model` is one of `supported_models`.
    pub fn validate(&self, supported_models: &[String]) -> Result<(), ConfigError> {
        if self.service.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "no search service selected".into(),
            ));
        }

        if !supported_models.iter().any(|m| m == &self.model) {
            return Err(ConfigError::ValidationError(format!(
                "model '{}' is not supported (expected one of: {})",
                self.model,
                supported_models.join(", ")
            )));
        }

        check_range(
            "num_chat_messages",
            self.num_chat_messages,
            MIN_CHAT_MESSAGES,
            MAX_CHAT_MESSAGES,
        )?;
        check_range(
            "num_retrieved_chunks",
            self.num_retrieved_chunks,
            MIN_RETRIEVED_CHUNKS,
            MAX_RETRIEVED_CHUNKS,
        )
    }
}

pub(crate) fn check_range(
    field: &str,
    value: usize,
    min: usize,
    max: usize,
) -> Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(format!(
            "{field} must be between {min} and {max}, got {value}"
        )))
    }
}
