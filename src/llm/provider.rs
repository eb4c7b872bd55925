//! Provider-specific configuration and detection.
//!
//! All supported providers speak the `OpenAI` Chat Completions dialect; they
//! differ in host, in whether the base URL already carries `/v1`, and in the
//! name shown to users when a call fails.

/// Supported LLM providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// Cerebras inference (api.cerebras.ai)
    Cerebras,
    /// `OpenAI` (api.openai.com)
    OpenAI,
    /// `OpenRouter` (openrouter.ai)
    OpenRouter,
    /// Together AI (together.ai, together.xyz)
    TogetherAI,
    /// Groq (groq.com)
    Groq,
    /// Generic OpenAI-compatible provider
    Generic,
}

impl Provider {
    /// Detect provider from base URL.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let provider = Provider::detect_from_url("https://api.cerebras.ai/v1");
    /// assert_eq!(provider, Provider::Cerebras);
    /// ```
    #[must_use]
    pub fn detect_from_url(base_url: &str) -> Self {
        let host = url::Url::parse(base_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_lowercase))
            .unwrap_or_default();

        if host.ends_with("cerebras.ai") {
            Self::Cerebras
        } else if host.ends_with("openrouter.ai") {
            Self::OpenRouter
        } else if host.ends_with("together.ai") || host.ends_with("together.xyz") {
            Self::TogetherAI
        } else if host.ends_with("groq.com") {
            Self::Groq
        } else if host.ends_with("openai.com") {
            Self::OpenAI
        } else {
            Self::Generic
        }
    }

    /// Human-readable provider name.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Cerebras => "Cerebras",
            Self::OpenAI => "OpenAI",
            Self::OpenRouter => "OpenRouter",
            Self::TogetherAI => "Together AI",
            Self::Groq => "Groq",
            Self::Generic => "Completion",
        }
    }

    /// Build the chat completions URL for this provider.
    ///
    /// Accepts base URLs with or without a trailing `/v1`.
    #[must_use]
    pub fn build_chat_url(self, base_url: &str) -> String {
        let base = base_url.trim_end_matches('/');

        if base.ends_with("/v1") {
            format!("{base}/chat/completions")
        } else {
            format!("{base}/v1/chat/completions")
        }
    }
}
