//! Configuration loading, validation, and management for RagChat.
//!
//! Loads configuration from `~/.ragchat/config.toml` with environment
//! variable overrides. Validates all settings at startup; per-turn options
//! are captured in a [`TurnConfig`] and validated again before every turn.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod turn;

pub use turn::{MAX_CHAT_MESSAGES, MAX_RETRIEVED_CHUNKS, MIN_CHAT_MESSAGES, MIN_RETRIEVED_CHUNKS, TurnConfig};

/// Models offered when the config file does not list its own.
pub const DEFAULT_MODELS: &[&str] = &[
    "snowflake-llama-3.3-70b",
    "claude-3-5-sonnet",
    "llama3.1-70b",
    "llama3.1-405b",
    "mistral-large2",
];

/// The root configuration structure.
///
/// Maps directly to `~/.ragchat/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Supported model identifiers, in menu order
    #[serde(default = "default_models")]
    pub models: Vec<String>,

    /// Completion backend
    #[serde(default)]
    pub completion: CompletionConfig,

    /// Search backend and services
    #[serde(default)]
    pub search: SearchConfig,

    /// Snowflake account shared by the Cortex backends
    #[serde(default)]
    pub snowflake: SnowflakeConfig,

    /// Per-turn defaults and greeting
    #[serde(default)]
    pub chat: ChatConfig,

    /// Wording of the answer prompt
    #[serde(default)]
    pub prompt: PromptProfile,
}

fn default_models() -> Vec<String> {
    DEFAULT_MODELS.iter().map(|m| m.to_string()).collect()
}
fn default_true() -> bool {
    true
}
fn default_timeout_secs() -> u64 {
    120
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("models", &self.models)
            .field("completion", &self.completion)
            .field("search", &self.search)
            .field("snowflake", &self.snowflake)
            .field("chat", &self.chat)
            .field("prompt", &self.prompt)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// "cortex" or any OpenAI-compatible provider name ("openai", "ollama", ...)
    #[serde(default = "default_completion_provider")]
    pub provider: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_completion_provider() -> String {
    "cortex".into()
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            provider: default_completion_provider(),
            api_key: None,
            api_url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl std::fmt::Debug for CompletionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionConfig")
            .field("provider", &self.provider)
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// "cortex" (Cortex Search REST) or "corpus" (local JSONL files)
    #[serde(default = "default_search_backend")]
    pub backend: String,

    /// Discover services from the account instead of using `services`
    #[serde(default)]
    pub discover: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Directory holding `<service>.jsonl` files for the corpus backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corpus_dir: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Statically configured services
    #[serde(default)]
    pub services: Vec<ServiceConfig>,
}

fn default_search_backend() -> String {
    "cortex".into()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            backend: default_search_backend(),
            discover: false,
            database: None,
            schema: None,
            corpus_dir: None,
            timeout_secs: default_timeout_secs(),
            services: vec![],
        }
    }
}

/// A statically configured search service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub name: String,

    #[serde(default = "default_search_column")]
    pub search_column: String,
}

fn default_search_column() -> String {
    "chunk".into()
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct SnowflakeConfig {
    /// e.g. `https://<account>.snowflakecomputing.com`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Value for `X-Snowflake-Authorization-Token-Type`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warehouse: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl std::fmt::Debug for SnowflakeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnowflakeConfig")
            .field("account_url", &self.account_url)
            .field("token", &redact(&self.token))
            .field("token_type", &self.token_type)
            .field("warehouse", &self.warehouse)
            .field("role", &self.role)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "default_model")]
    pub default_model: String,

    #[serde(default = "default_true")]
    pub use_chat_history: bool,

    #[serde(default = "default_num_chat_messages")]
    pub num_chat_messages: usize,

    #[serde(default = "default_num_retrieved_chunks")]
    pub num_retrieved_chunks: usize,

    #[serde(default)]
    pub debug: bool,

    /// First assistant message of every conversation
    #[serde(default = "default_greeting")]
    pub greeting: String,
}

fn default_model() -> String {
    DEFAULT_MODELS[0].into()
}
fn default_num_chat_messages() -> usize {
    5
}
fn default_num_retrieved_chunks() -> usize {
    10
}
fn default_greeting() -> String {
    "👋 Hi there! I'm your friendly AI assistant. Whether you have questions about the \
     [State of Michigan EMS Protocol Suite](https://www.michigan.gov/mdhhs/inside-mdhhs/legislationpolicy/ems/protocols/michigan-protocols) \
     or need guidance on specific procedures, I'm here to help. Just ask me anything!"
        .into()
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            default_model: default_model(),
            use_chat_history: true,
            num_chat_messages: default_num_chat_messages(),
            num_retrieved_chunks: default_num_retrieved_chunks(),
            debug: false,
            greeting: default_greeting(),
        }
    }
}

/// Domain wording for the answer prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptProfile {
    /// Completes "You are an expert AI assistant ..."
    #[serde(default = "default_assistant_description")]
    pub assistant_description: String,

    /// Name of the document collection, as cited in the TASK section
    #[serde(default = "default_corpus_name")]
    pub corpus_name: String,
}

fn default_assistant_description() -> String {
    "powered by Snowflake Cortex. You are designed to support EMS personnel in Michigan by \
     providing accurate and context-specific answers."
        .into()
}
fn default_corpus_name() -> String {
    "State of Michigan EMS Protocol Suite".into()
}

impl Default for PromptProfile {
    fn default() -> Self {
        Self {
            assistant_description: default_assistant_description(),
            corpus_name: default_corpus_name(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.ragchat/config.toml).
    ///
    /// Environment variables override file values:
    /// - `RAGCHAT_API_KEY`, then `OPENAI_API_KEY`: completion API key
    /// - `SNOWFLAKE_ACCOUNT_URL`, `SNOWFLAKE_TOKEN`: Snowflake account access
    /// - `RAGCHAT_MODEL`: default model
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.completion.api_key.is_none() {
            self.completion.api_key = lookup("RAGCHAT_API_KEY").or_else(|| lookup("OPENAI_API_KEY"));
        }
        if let Some(url) = lookup("SNOWFLAKE_ACCOUNT_URL") {
            self.snowflake.account_url = Some(url);
        }
        if let Some(token) = lookup("SNOWFLAKE_TOKEN") {
            self.snowflake.token = Some(token);
        }
        if let Some(model) = lookup("RAGCHAT_MODEL") {
            self.chat.default_model = model;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".ragchat")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.models.is_empty() {
            return Err(ConfigError::ValidationError("models must not be empty".into()));
        }

        if !self.models.contains(&self.chat.default_model) {
            return Err(ConfigError::ValidationError(format!(
                "chat.default_model '{}' is not in models",
                self.chat.default_model
            )));
        }

        if !matches!(self.search.backend.as_str(), "cortex" | "corpus") {
            return Err(ConfigError::ValidationError(format!(
                "search.backend must be 'cortex' or 'corpus', got '{}'",
                self.search.backend
            )));
        }

        if self.completion.timeout_secs == 0 || self.search.timeout_secs == 0 {
            return Err(ConfigError::ValidationError("timeouts must be > 0".into()));
        }

        turn::check_range(
            "chat.num_chat_messages",
            self.chat.num_chat_messages,
            MIN_CHAT_MESSAGES,
            MAX_CHAT_MESSAGES,
        )?;
        turn::check_range(
            "chat.num_retrieved_chunks",
            self.chat.num_retrieved_chunks,
            MIN_RETRIEVED_CHUNKS,
            MAX_RETRIEVED_CHUNKS,
        )?;

        Ok(())
    }

    /// Whether the Cortex backends have what they need to connect.
    pub fn has_snowflake_credentials(&self) -> bool {
        self.snowflake.account_url.is_some() && self.snowflake.token.is_some()
    }

    /// Turn options seeded from the `[chat]` defaults.
    pub fn turn_defaults(&self, service: impl Into<String>) -> TurnConfig {
        TurnConfig {
            service: service.into(),
            model: self.chat.default_model.clone(),
            num_chat_messages: self.chat.num_chat_messages,
            num_retrieved_chunks: self.chat.num_retrieved_chunks,
            use_chat_history: self.chat.use_chat_history,
            debug: self.chat.debug,
        }
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            models: default_models(),
            completion: CompletionConfig::default(),
            search: SearchConfig::default(),
            snowflake: SnowflakeConfig::default(),
            chat: ChatConfig::default(),
            prompt: PromptProfile::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigError> for ragchat_core::Error {
    fn from(err: ConfigError) -> Self {
        ragchat_core::Error::configuration(err.to_string())
    }
}
