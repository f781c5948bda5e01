//! HTTP clients for the upstream provider APIs.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::error::{LlmError, Result};
use crate::provider::Provider;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 1024;

/// Something that turns a prompt into a completion.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// The provider this client talks to.
    fn provider(&self) -> Provider;

    /// Send a single-turn user prompt and return the text reply.
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// A keyed client for one provider's HTTP API.
#[derive(Clone)]
pub struct HttpProvider {
    provider: Provider,
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for HttpProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpProvider")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl HttpProvider {
    /// Create a client. `base_url` has no trailing path.
    #[must_use]
    pub fn new(
        provider: Provider,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            provider,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    fn request(&self, prompt: &str) -> reqwest::RequestBuilder {
        let model = self.provider.upstream_model();
        match self.provider {
            Provider::Anthropic => self
                .client
                .post(format!("{}/v1/messages", self.base_url))
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&json!({
                    "model": model,
                    "max_tokens": MAX_TOKENS,
                    "messages": [{ "role": "user", "content": prompt }],
                })),
            Provider::OpenAi => self
                .client
                .post(format!("{}/v1/chat/completions", self.base_url))
                .bearer_auth(&self.api_key)
                .json(&json!({
                    "model": model,
                    "messages": [{ "role": "user", "content": prompt }],
                })),
            Provider::Gemini => self
                .client
                .post(format!(
                    "{}/v1beta/models/{model}:generateContent",
                    self.base_url
                ))
                .header("x-goog-api-key", &self.api_key)
                .json(&json!({
                    "contents": [{ "parts": [{ "text": prompt }] }],
                })),
        }
    }
}

#[async_trait]
impl LlmProvider for HttpProvider {
    fn provider(&self) -> Provider {
        self.provider
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let response = self
            .request(prompt)
            .send()
            .await
            .map_err(|e| LlmError::Upstream(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(provider = %self.provider, %status, "Provider returned an error");
            return Err(LlmError::Upstream(upstream_message(status, &body)));
        }

        let text = match self.provider {
            Provider::Anthropic => response
                .json::<AnthropicResponse>()
                .await
                .map_err(invalid_body)?
                .content
                .into_iter()
                .find_map(|block| block.text),
            Provider::OpenAi => response
                .json::<OpenAiResponse>()
                .await
                .map_err(invalid_body)?
                .choices
                .into_iter()
                .find_map(|choice| choice.message.content),
            Provider::Gemini => response
                .json::<GeminiResponse>()
                .await
                .map_err(invalid_body)?
                .candidates
                .into_iter()
                .flat_map(|candidate| candidate.content.parts)
                .find_map(|part| part.text),
        };

        text.ok_or_else(|| LlmError::Upstream(format!("{} returned no text", self.provider)))
    }
}

fn invalid_body(err: reqwest::Error) -> LlmError {
    LlmError::Upstream(format!("invalid response: {err}"))
}

// Surface the provider's own error message when it sends one.
fn upstream_message(status: reqwest::StatusCode, body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(serde_json::Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| format!("HTTP {status}"))
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<AnthropicBlock>,
}

#[derive(Debug, Deserialize)]
struct AnthropicBlock {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    text: Option<String>,
}
