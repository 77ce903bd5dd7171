//! LLM service boundary.
//!
//! The engine treats the language model as an opaque request/response
//! service reached through [`ChatClient`]. Three call sites share it:
//! routing classification, web query planning, and answer synthesis.
//! [`HttpChatClient`] speaks the OpenAI chat-completions wire format, so
//! any compatible server works (Ollama, vLLM, llama.cpp server, hosted
//! providers).

use crate::config::LlmConfig;
use crate::error::{Result, SiftError};
use async_trait::async_trait;
use std::time::Duration;
use std::time::Instant;
use tracing::debug;

/// An opaque request/response language-model call.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Send one system + user prompt pair and return the reply text.
    ///
    /// # Errors
    ///
    /// Returns [`SiftError::Llm`] if the call fails or the reply carries
    /// no content. Callers are expected to have their own deterministic
    /// fallback — nothing in the engine treats this error as fatal.
    async fn complete(&self, system: &str, user: &str) -> Result<String>;
}

/// Strip a Markdown code fence from a model reply, if present.
///
/// Models asked for JSON routinely wrap it in ```` ```json ```` fences;
/// callers parse the inner text.
pub fn strip_code_fences(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

/// HTTP client for an OpenAI-compatible chat completions endpoint.
pub struct HttpChatClient {
    config: LlmConfig,
    client: reqwest::Client,
}

impl HttpChatClient {
    /// Create a client from connection config.
    ///
    /// # Errors
    ///
    /// Returns [`SiftError::Llm`] if the HTTP client cannot be built.
    pub fn new(config: LlmConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SiftError::Llm(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    fn completions_url(&self) -> String {
        // Accept base URLs with or without a trailing `/v1`.
        let base = self
            .config
            .api_url
            .strip_suffix("/v1")
            .unwrap_or(&self.config.api_url);
        let base = base.trim_end_matches('/');
        format!("{base}/v1/chat/completions")
    }
}

#[async_trait]
impl ChatClient for HttpChatClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.config.api_model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
            "stream": false,
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
        });

        let start = Instant::now();
        let mut request = self.client.post(self.completions_url()).json(&body);
        if !self.config.api_key.is_empty() {
            request = request.bearer_auth(&self.config.api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SiftError::Llm(format!("API request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(SiftError::Llm(format!(
                "API returned status {}",
                response.status()
            )));
        }

        let reply: serde_json::Value = response
            .json()
            .await
            .map_err(|e| SiftError::Llm(format!("response decode failed: {e}")))?;

        let content = reply["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| SiftError::Llm("reply carried no message content".into()))?;

        debug!(
            model = %self.config.api_model,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "chat completion finished"
        );

        Ok(content.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> LlmConfig {
        LlmConfig {
            api_url: server.uri(),
            api_key: "sk-test".into(),
            api_model: "test-model".into(),
            ..Default::default()
        }
    }

    #[test]
    fn strip_code_fences_handles_plain_and_fenced_replies() {
        assert_eq!(strip_code_fences("{\"a\": 1}"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("  {\"a\": 1}  "), "{\"a\": 1}");
    }

    #[test]
    fn completions_url_handles_v1_suffix() {
        let client = HttpChatClient::new(LlmConfig {
            api_url: "http://localhost:11434/v1".into(),
            ..Default::default()
        })
        .expect("client");
        assert_eq!(
            client.completions_url(),
            "http://localhost:11434/v1/chat/completions"
        );

        let client = HttpChatClient::new(LlmConfig {
            api_url: "http://localhost:11434/".into(),
            ..Default::default()
        })
        .expect("client");
        assert_eq!(
            client.completions_url(),
            "http://localhost:11434/v1/chat/completions"
        );
    }

    #[tokio::test]
    async fn complete_sends_messages_and_extracts_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(serde_json::json!({
                "model": "test-model",
                "stream": false,
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "{\"agent\": \"web\"}"}}]
            })))
            .mount(&server)
            .await;

        let client = HttpChatClient::new(config_for(&server)).expect("client");
        let reply = client
            .complete("classify", "is GitHub down?")
            .await
            .expect("complete should succeed");
        assert_eq!(reply, "{\"agent\": \"web\"}");
    }

    #[tokio::test]
    async fn error_status_surfaces_as_llm_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = HttpChatClient::new(config_for(&server)).expect("client");
        let result = client.complete("s", "u").await;
        assert!(matches!(result, Err(SiftError::Llm(_))));
    }

    #[tokio::test]
    async fn missing_content_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})),
            )
            .mount(&server)
            .await;

        let client = HttpChatClient::new(config_for(&server)).expect("client");
        let result = client.complete("s", "u").await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("no message content"));
    }
}
