//! Snowflake Cortex inference provider.
//!
//! Calls `POST /api/v2/cortex/inference:complete`. The endpoint may answer
//! with a plain JSON body or with server-sent events; both are folded into a
//! single completion since the assistant delivers whole answers only.

use async_trait::async_trait;
use ragchat_core::error::CompletionError;
use ragchat_core::provider::*;
use serde::Deserialize;
use tracing::{debug, trace, warn};

use crate::snowflake::{SnowflakeAccount, http_client};

const COMPLETE_PATH: &str = "/api/v2/cortex/inference:complete";

/// Cheapest authorized call on the account: list at most one database.
const HEALTH_PATH: &str = "/api/v2/databases?showLimit=1";

pub struct CortexCompleteProvider {
    account: SnowflakeAccount,
    client: reqwest::Client,
}

impl CortexCompleteProvider {
    pub fn new(account: SnowflakeAccount, timeout_secs: u64) -> Self {
        Self {
            account,
            client: http_client(timeout_secs),
        }
    }

    fn request_body(request: &CompletionRequest) -> serde_json::Value {
        serde_json::json!({
            "model": request.model,
            "messages": [{ "content": request.prompt }],
            "stream": false,
        })
    }
}

#[async_trait]
impl CompletionProvider for CortexCompleteProvider {
    fn name(&self) -> &str {
        "cortex"
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<CompletionResponse, CompletionError> {
        let url = self.account.url(COMPLETE_PATH);
        let body = Self::request_body(&request);

        debug!(model = %request.model, prompt_chars = request.prompt.len(), "Sending Cortex completion request");

        let response = self
            .account
            .authorize(self.client.post(&url))
            .header("Accept", "application/json, text/event-stream")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CompletionError::Timeout(e.to_string())
                } else {
                    CompletionError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| CompletionError::Network(e.to_string()))?;

        match status {
            200 => parse_body(&text, &request.model),
            400 if text.contains("model") => {
                warn!(status, body = %text, "Cortex rejected model");
                Err(CompletionError::UnsupportedModel(request.model))
            }
            401 | 403 => Err(CompletionError::AuthenticationFailed(
                "Snowflake token rejected".into(),
            )),
            429 => Err(CompletionError::RateLimited {
                retry_after_secs: 5,
            }),
            _ => {
                warn!(status, body = %text, "Cortex returned error");
                Err(CompletionError::ApiError {
                    status_code: status,
                    message: text,
                })
            }
        }
    }

    async fn health_check(&self) -> std::result::Result<bool, CompletionError> {
        let response = self
            .account
            .authorize(self.client.get(self.account.url(HEALTH_PATH)))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CompletionError::Timeout(e.to_string())
                } else {
                    CompletionError::Network(e.to_string())
                }
            })?;

        health_from_status(response.status().as_u16())
    }
}

fn health_from_status(status: u16) -> std::result::Result<bool, CompletionError> {
    match status {
        200..=299 => Ok(true),
        401 | 403 => Err(CompletionError::AuthenticationFailed(
            "Snowflake token rejected".into(),
        )),
        _ => Ok(false),
    }
}

/// Parse either a JSON completion or an SSE stream of deltas.
fn parse_body(
    body: &str,
    requested_model: &str,
) -> std::result::Result<CompletionResponse, CompletionError> {
    let trimmed = body.trim_start();
    if trimmed.starts_with("data:") || trimmed.starts_with("event:") {
        return parse_event_stream(body, requested_model);
    }

    let parsed: ApiResponse = serde_json::from_str(body).map_err(|e| CompletionError::ApiError {
        status_code: 200,
        message: format!("Failed to parse response: {e}"),
    })?;

    let text = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.or(c.delta).and_then(|m| m.content))
        .ok_or(CompletionError::EmptyResponse)?;

    Ok(CompletionResponse {
        text,
        model: parsed.model.unwrap_or_else(|| requested_model.to_string()),
        usage: parsed.usage.map(Into::into),
    })
}

fn parse_event_stream(
    body: &str,
    requested_model: &str,
) -> std::result::Result<CompletionResponse, CompletionError> {
    let mut text = String::new();
    let mut model = None;
    let mut usage = None;

    for line in body.lines() {
        let line = line.trim_end_matches('\r');
        let Some(data) = line.strip_prefix("data:") else {
            continue;
        };
        let data = data.trim();
        if data.is_empty() || data == "[DONE]" {
            continue;
        }

        match serde_json::from_str::<ApiResponse>(data) {
            Ok(chunk) => {
                if let Some(m) = chunk.model {
                    model = Some(m);
                }
                if let Some(u) = chunk.usage {
                    usage = Some(u.into());
                }
                for choice in chunk.choices {
                    if let Some(content) = choice.delta.or(choice.message).and_then(|m| m.content) {
                        text.push_str(&content);
                    }
                }
            }
            Err(e) => {
                trace!(data = %data, error = %e, "Ignoring unparseable SSE chunk");
            }
        }
    }

    if text.is_empty() {
        return Err(CompletionError::EmptyResponse);
    }

    Ok(CompletionResponse {
        text,
        model: model.unwrap_or_else(|| requested_model.to_string()),
        usage,
    })
}

// --- Cortex API types (internal) ---

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<ApiChoice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    #[serde(default)]
    message: Option<ApiContent>,
    #[serde(default)]
    delta: Option<ApiContent>,
}

#[derive(Debug, Deserialize)]
struct ApiContent {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

impl From<ApiUsage> for Usage {
    fn from(u: ApiUsage) -> Self {
        Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_wraps_prompt() {
        let body = CortexCompleteProvider::request_body(&CompletionRequest::new(
            "claude-3-5-sonnet",
            "prompt text",
        ));
        assert_eq!(body["model"], "claude-3-5-sonnet");
        assert_eq!(body["messages"][0]["content"], "prompt text");
    }

    #[test]
    fn health_status_mapping() {
        assert!(health_from_status(200).unwrap());
        assert!(!health_from_status(500).unwrap());
        assert!(matches!(
            health_from_status(401),
            Err(CompletionError::AuthenticationFailed(_))
        ));
        assert!(matches!(
            health_from_status(403),
            Err(CompletionError::AuthenticationFailed(_))
        ));
    }

    #[tokio::test]
    async fn health_check_reports_unreachable_account() {
        let provider = CortexCompleteProvider::new(
            SnowflakeAccount::new("http://127.0.0.1:9", "bad-token", None),
            2,
        );
        let result = provider.health_check().await;
        assert!(matches!(
            result,
            Err(CompletionError::Network(_)) | Err(CompletionError::Timeout(_))
        ));
    }

    #[test]
    fn parses_json_body() {
        let body = r#"{"choices":[{"message":{"content":"Yes, if the airway is compromised."}}],"usage":{"prompt_tokens":100,"completion_tokens":8,"total_tokens":108}}"#;
        let resp = parse_body(body, "mistral-large2").unwrap();
        assert_eq!(resp.text, "Yes, if the airway is compromised.");
        assert_eq!(resp.model, "mistral-large2");
        assert_eq!(resp.usage.unwrap().total_tokens, 108);
    }

    #[test]
    fn accumulates_event_stream() {
        let body = "data: {\"model\":\"llama3.1-70b\",\"choices\":[{\"delta\":{\"content\":\"Call \"}}]}\n\n\
                    data: {\"choices\":[{\"delta\":{\"content\":\"medical control.\"}}]}\n\n\
                    data: {\"choices\":[{\"delta\":{}}],\"usage\":{\"prompt_tokens\":9,\"completion_tokens\":4,\"total_tokens\":13}}\n\n";
        let resp = parse_body(body, "fallback").unwrap();
        assert_eq!(resp.text, "Call medical control.");
        assert_eq!(resp.model, "llama3.1-70b");
        assert_eq!(resp.usage.unwrap().completion_tokens, 4);
    }

    #[test]
    fn stream_skips_garbage_and_done() {
        let body = "event: message\ndata: not-json\ndata: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\ndata: [DONE]\n";
        assert_eq!(parse_body(body, "m").unwrap().text, "ok");
    }

    #[test]
    fn empty_stream_is_an_error() {
        assert!(matches!(
            parse_body("data: [DONE]\n", "m"),
            Err(CompletionError::EmptyResponse)
        ));
    }

    #[test]
    fn invalid_json_is_api_error() {
        assert!(matches!(
            parse_body("<html>oops</html>", "m"),
            Err(CompletionError::ApiError { .. })
        ));
    }
}
