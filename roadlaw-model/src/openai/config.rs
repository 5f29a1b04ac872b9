//! Configuration for OpenAI-compatible chat providers.

use std::time::Duration;

/// The public OpenAI API base.
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Connection parameters for [`OpenAIClient`](super::OpenAIClient).
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    pub api_key: String,
    pub model: String,
    /// API base without the `/chat/completions` suffix, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    pub organization_id: Option<String>,
    /// Bound on a complete non-streaming call, and on receiving response
    /// headers for a streaming one.
    pub request_timeout: Duration,
    /// Longest silence tolerated between two streamed chunks.
    pub stream_idle_timeout: Duration,
}

impl OpenAIConfig {
    /// Config for the public OpenAI API.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: OPENAI_API_BASE.to_string(),
            organization_id: None,
            request_timeout: Duration::from_secs(60),
            stream_idle_timeout: Duration::from_secs(30),
        }
    }

    /// Config for an OpenAI-compatible API (vLLM, Ollama, a gateway, ...).
    pub fn compatible(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self::new(api_key, model).with_base_url(base_url)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_organization(mut self, organization_id: impl Into<String>) -> Self {
        self.organization_id = Some(organization_id.into());
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_stream_idle_timeout(mut self, timeout: Duration) -> Self {
        self.stream_idle_timeout = timeout;
        self
    }
}
