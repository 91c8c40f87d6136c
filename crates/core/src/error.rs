//! Error types for the RagChat domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; [`Error`] unifies them.

use thiserror::Error;

/// The top-level error type for all RagChat operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    // --- Search errors ---
    #[error("Retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    // --- Completion errors ---
    #[error("Completion error: {0}")]
    Completion(#[from] CompletionError),

    // --- Service discovery errors ---
    #[error("Discovery error: {0}")]
    Discovery(#[from] DiscoveryError),
}

impl Error {
    /// Shorthand for a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Short stage label used in logs and lifecycle events.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "configuration",
            Self::Retrieval(_) => "retrieval",
            Self::Completion(_) => "completion",
            Self::Discovery(_) => "discovery",
        }
    }
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum RetrievalError {
    #[error("Search request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Search authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Search result is missing column '{column}' for service {service}")]
    MissingColumn { service: String, column: String },

    #[error("Invalid search response: {0}")]
    InvalidResponse(String),

    #[error("Search backend unavailable: {0}")]
    Unavailable(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Clone, Error)]
pub enum CompletionError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not supported: {0}")]
    UnsupportedModel(String),

    #[error("Provider returned no completion text")]
    EmptyResponse,

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Clone, Error)]
pub enum DiscoveryError {
    #[error("Statement failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Unexpected statement result: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(String),
}
