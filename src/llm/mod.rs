//! Completion-service boundary.
//!
//! The generator only ever needs `prompt in, text out`. This module provides
//! that seam as the [`CompletionService`] trait, an `OpenAI`-compatible
//! implementation of it, and a cache that hands out one client per
//! (credential, model) pair.
//!
//! # Drivers
//!
//! - [`ChatCompletionsDriver`]: Chat Completions API (`/v1/chat/completions`),
//!   non-streaming, single user message per call.
//!
//! # Example
//!
//! ```rust,ignore
//! use game_forge::config::ApiKey;
//! use game_forge::llm::{ClientCache, CompletionService};
//!
//! let cache = ClientCache::new("https://api.cerebras.ai/v1", ApiKey::new("csk-...").unwrap());
//! let client = cache.client_for("qwen-3-235b-a22b-instruct-2507");
//! let html = client.complete("Generate a snake game").await?;
//! ```

pub mod chat_completions;
pub mod client_cache;
pub mod provider;

pub use chat_completions::ChatCompletionsDriver;
pub use client_cache::{ClientCache, ClientFactory};
pub use provider::Provider;

use crate::config::ApiKey;

/// LLM connection and model settings for a single client.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    /// Base URL for the API (e.g., `https://api.cerebras.ai/v1`).
    pub base_url: String,
    /// API key sent as a bearer token.
    pub api_key: ApiKey,
    /// Model identifier.
    pub model: String,
    /// Provider type, detected from `base_url`.
    pub provider: Provider,
}

impl LlmSettings {
    /// Build settings, detecting the provider from the base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_key: ApiKey, model: impl Into<String>) -> Self {
        let base_url = base_url.into();
        let provider = Provider::detect_from_url(&base_url);
        Self {
            base_url,
            api_key,
            model: model.into(),
            provider,
        }
    }
}

/// Failure of a single completion call.
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    /// Transport failure: DNS, TLS, connection reset, client timeout.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the provider.
        message: String,
    },

    /// The provider answered 2xx but without usable text.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// Text-in/text-out completion call.
///
/// Each call is stateless from the model's point of view.
#[async_trait::async_trait]
pub trait CompletionService: Send + Sync {
    /// Send `prompt` as the only user message and return the reply text.
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;

    /// Provider name shown to users in error messages.
    fn provider_name(&self) -> &str {
        "Completion"
    }
}
