//! OpenAI Chat Completions API driver.
//!
//! This module implements [`CompletionService`] for the Chat Completions API
//! (`/v1/chat/completions`). Requests are non-streaming: the whole reply is
//! needed before it can be checked and rendered.

use serde::Serialize;

use super::{CompletionError, CompletionService, LlmSettings};

/// The single message sent per call.
#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> ChatMessage<'a> {
    fn user(content: &'a str) -> Self {
        Self {
            role: "user",
            content,
        }
    }
}

/// Driver for the OpenAI Chat Completions API.
#[derive(Clone)]
pub struct ChatCompletionsDriver {
    http: reqwest::Client,
    settings: LlmSettings,
}

impl std::fmt::Debug for ChatCompletionsDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionsDriver")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl ChatCompletionsDriver {
    /// Create a new Chat Completions driver with the given settings.
    #[must_use]
    pub fn new(settings: LlmSettings) -> Self {
        Self::with_client(reqwest::Client::new(), settings)
    }

    /// Create a driver sharing an existing HTTP connection pool.
    #[must_use]
    pub fn with_client(http: reqwest::Client, settings: LlmSettings) -> Self {
        Self { http, settings }
    }
}

#[async_trait::async_trait]
impl CompletionService for ChatCompletionsDriver {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let url = self
            .settings
            .provider
            .build_chat_url(&self.settings.base_url);

        let body = serde_json::json!({
            "model": self.settings.model,
            "stream": false,
            "messages": [ChatMessage::user(prompt)],
        });

        tracing::debug!(
            url = %url,
            model = %self.settings.model,
            prompt_length = prompt.len(),
            "Sending chat completion request"
        );

        let resp = self
            .http
            .post(&url)
            .bearer_auth(self.settings.api_key.expose())
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;

        tracing::debug!(
            status = %status,
            body_length = text.len(),
            "Chat completion response received"
        );

        if !status.is_success() {
            let message = provider_error_message(&text).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("unknown error")
                    .to_string()
            });
            return Err(CompletionError::Api {
                status: status.as_u16(),
                message,
            });
        }

        extract_content(&text)
    }

    fn provider_name(&self) -> &str {
        self.settings.provider.display_name()
    }
}

/// Pull `choices[0].message.content` out of a completion body.
fn extract_content(body: &str) -> Result<String, CompletionError> {
    let v: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| CompletionError::MalformedResponse(e.to_string()))?;

    v["choices"][0]["message"]["content"]
        .as_str()
        .map(ToString::to_string)
        .ok_or_else(|| {
            CompletionError::MalformedResponse(
                "missing choices[0].message.content".to_string(),
            )
        })
}

/// Best-effort error text from a provider error body.
///
/// Providers use `{"error": {"message": ..}}` or a top-level `message`;
/// anything else is returned as raw text.
fn provider_error_message(body: &str) -> Option<String> {
    let parsed = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v["error"]["message"]
                .as_str()
                .or_else(|| v["message"].as_str())
                .map(ToString::to_string)
        });

    parsed.or_else(|| {
        let raw = body.trim();
        (!raw.is_empty()).then(|| raw.to_string())
    })
}
