//! OpenAI client implementation.

use async_openai::{Client, config::OpenAIConfig as AsyncOpenAIConfig, error::OpenAIError};
use async_stream::try_stream;
use async_trait::async_trait;
use futures::StreamExt;
use roadlaw_core::{CoreError, Llm, LlmRequest, LlmResponse, LlmResponseStream};
use tracing::{debug, error, instrument};

use super::config::OpenAIConfig;
use super::convert;

/// Client for the OpenAI chat-completions API and compatible servers.
///
/// Tool calling, JSON-object mode and fixed seeds are forwarded as-is.
/// Every call is bounded by [`OpenAIConfig::request_timeout`], and a
/// streamed reply by [`OpenAIConfig::stream_idle_timeout`] between chunks.
#[derive(Clone)]
pub struct OpenAIClient {
    client: Client<AsyncOpenAIConfig>,
    config: OpenAIConfig,
}

impl OpenAIClient {
    /// Create a new OpenAI client.
    pub fn new(config: OpenAIConfig) -> Result<Self, CoreError> {
        if config.api_key.is_empty() {
            return Err(CoreError::Config("OpenAI API key must not be empty".into()));
        }

        let mut openai_config = AsyncOpenAIConfig::new()
            .with_api_key(&config.api_key)
            .with_api_base(&config.base_url);
        if let Some(org_id) = &config.organization_id {
            openai_config = openai_config.with_org_id(org_id);
        }

        let http = reqwest::Client::builder()
            .connect_timeout(config.request_timeout)
            .build()
            .map_err(|e| CoreError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client: Client::with_config(openai_config).with_http_client(http), config })
    }

    /// Create a client for an OpenAI-compatible API.
    pub fn compatible(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, CoreError> {
        Self::new(OpenAIConfig::compatible(api_key, base_url, model))
    }

    fn timeout_error(&self, operation: &str, seconds: u64) -> CoreError {
        CoreError::Timeout { operation: format!("{operation} ({})", self.config.model), seconds }
    }

    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, CoreError> {
        let body = convert::build_request(&self.config.model, request).map_err(build_error)?;
        let response = tokio::time::timeout(self.config.request_timeout, self.client.chat().create(body))
            .await
            .map_err(|_| self.timeout_error("chat completion", self.config.request_timeout.as_secs()))?
            .map_err(api_error)?;
        Ok(convert::from_completion(response))
    }
}

fn build_error(e: OpenAIError) -> CoreError {
    CoreError::Model(format!("Failed to build request: {e}"))
}

fn api_error(e: OpenAIError) -> CoreError {
    error!(provider = "OpenAI", error = %e, "API error");
    CoreError::Model(format!("OpenAI API error: {e}"))
}

#[async_trait]
impl Llm for OpenAIClient {
    fn name(&self) -> &str {
        &self.config.model
    }

    #[instrument(skip_all, fields(
        model = %self.config.model,
        messages.count = request.contents.len(),
        tools.count = request.tools.len(),
        stream = stream,
    ))]
    async fn generate_content(
        &self,
        request: LlmRequest,
        stream: bool,
    ) -> Result<LlmResponseStream, CoreError> {
        let client = self.clone();

        if !stream {
            let output = try_stream! {
                let response = client.complete(&request).await?;
                yield response;
            };
            return Ok(Box::pin(output));
        }

        let output = try_stream! {
            let body = convert::build_request(&client.config.model, &request).map_err(build_error)?;
            let bound = client.config.request_timeout;
            let mut chunks = tokio::time::timeout(bound, client.client.chat().create_stream(body))
                .await
                .map_err(|_| client.timeout_error("chat completion", bound.as_secs()))?
                .map_err(api_error)?;

            let idle = client.config.stream_idle_timeout;
            let mut tool_calls = convert::ToolCallAccumulator::default();
            let mut finish_reason = None;

            loop {
                let next = tokio::time::timeout(idle, chunks.next())
                    .await
                    .map_err(|_| client.timeout_error("next stream chunk", idle.as_secs()))?;
                let Some(chunk) = next else { break };
                let chunk = chunk.map_err(api_error)?;

                for choice in chunk.choices {
                    if let Some(text) = choice.delta.content.filter(|t| !t.is_empty()) {
                        yield LlmResponse::delta(text);
                    }
                    tool_calls.push(choice.delta.tool_calls.unwrap_or_default());
                    if choice.finish_reason.is_some() {
                        finish_reason = convert::parse_finish_reason(choice.finish_reason);
                    }
                }
            }

            debug!(has_tool_calls = !tool_calls.is_empty(), ?finish_reason, "stream finished");
            let content = (!tool_calls.is_empty()).then(|| tool_calls.finish());
            yield LlmResponse { content, partial: false, turn_complete: true, finish_reason };
        };

        Ok(Box::pin(output))
    }
}
