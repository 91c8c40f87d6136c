//! Shared Snowflake account access for the Cortex backends.
//!
//! Cortex Search, Cortex inference and the SQL statements API all sit behind
//! the same account URL and accept the same bearer token.

use std::time::Duration;

/// Token type sent when none is configured.
pub const DEFAULT_TOKEN_TYPE: &str = "PROGRAMMATIC_ACCESS_TOKEN";

/// Account URL plus credentials, cloned into each Cortex client.
#[derive(Clone)]
pub struct SnowflakeAccount {
    base_url: String,
    token: String,
    token_type: String,
}

impl SnowflakeAccount {
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        token_type: Option<&str>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            token_type: token_type.unwrap_or(DEFAULT_TOKEN_TYPE).to_string(),
        }
    }

    /// Build from the `[snowflake]` config section, if it is complete.
    pub fn from_config(config: &ragchat_config::SnowflakeConfig) -> Option<Self> {
        let url = config.account_url.as_deref()?;
        let token = config.token.as_deref()?;
        Some(Self::new(url, token, config.token_type.as_deref()))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an API path such as `/api/v2/statements`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attach auth and content headers.
    pub fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("Authorization", format!("Bearer {}", self.token))
            .header("X-Snowflake-Authorization-Token-Type", &self.token_type)
            .header("Content-Type", "application/json")
    }
}

impl std::fmt::Debug for SnowflakeAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnowflakeAccount")
            .field("base_url", &self.base_url)
            .field("token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .finish()
    }
}

/// HTTP client with the configured timeout.
pub(crate) fn http_client(timeout_secs: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Quote a Snowflake identifier, escaping embedded quotes.
pub(crate) fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
