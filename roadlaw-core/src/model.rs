//! The [`Llm`] trait and its request/response types.

use std::pin::Pin;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::content::{Content, Part, ROLE_MODEL};
use crate::error::Result;

/// A tool the model may ask the caller to invoke.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    /// JSON schema of the tool's arguments object.
    pub parameters: Value,
}

/// Shape the model is asked to answer in.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    #[default]
    Text,
    /// Force a single JSON object as the response body.
    JsonObject,
}

/// Decoding parameters for one request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GenerateConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    #[serde(default)]
    pub response_format: ResponseFormat,
}

impl GenerateConfig {
    /// Fixed temperature and seed so identical requests decode identically.
    pub fn deterministic(seed: i64) -> Self {
        Self { temperature: Some(0.0), seed: Some(seed), ..Self::default() }
    }

    pub fn with_response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = format;
        self
    }
}

/// A chat-completion request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LlmRequest {
    pub contents: Vec<Content>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDeclaration>,
    #[serde(default)]
    pub config: GenerateConfig,
}

impl LlmRequest {
    pub fn new(contents: Vec<Content>) -> Self {
        Self { contents, ..Self::default() }
    }

    pub fn with_tools(mut self, tools: Vec<ToolDeclaration>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_config(mut self, config: GenerateConfig) -> Self {
        self.config = config;
        self
    }
}

/// Why the model stopped producing output.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ToolCalls,
    ContentFilter,
    Other,
}

/// One item of a model response stream.
///
/// In streaming mode `content` holds an increment and `partial` is set; the
/// last item carries `turn_complete` and any accumulated tool calls.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LlmResponse {
    pub content: Option<Content>,
    #[serde(default)]
    pub partial: bool,
    #[serde(default)]
    pub turn_complete: bool,
    pub finish_reason: Option<FinishReason>,
}

impl LlmResponse {
    /// A complete, non-partial text response.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: Some(Content::model(text)),
            partial: false,
            turn_complete: true,
            finish_reason: Some(FinishReason::Stop),
        }
    }

    /// A streaming text increment.
    pub fn delta(text: impl Into<String>) -> Self {
        Self { content: Some(Content::model(text)), partial: true, ..Self::default() }
    }

    /// A complete response requesting one tool call.
    pub fn function_call(id: impl Into<String>, name: impl Into<String>, args: Value) -> Self {
        Self {
            content: Some(Content::new(ROLE_MODEL).with_function_call(
                Some(id.into()),
                name,
                args,
            )),
            partial: false,
            turn_complete: true,
            finish_reason: Some(FinishReason::ToolCalls),
        }
    }

    /// Text carried by this item, empty when there is none.
    pub fn text_content(&self) -> String {
        self.content.as_ref().map(Content::text).unwrap_or_default()
    }
}

/// Lazily produced model output.
pub type LlmResponseStream = Pin<Box<dyn Stream<Item = Result<LlmResponse>> + Send>>;

/// A chat-completion capable language model.
#[async_trait]
pub trait Llm: Send + Sync {
    /// Model identifier, used in logs and tool-call arguments.
    fn name(&self) -> &str;

    /// Run `request`. With `stream` set the provider yields increments as
    /// they arrive; otherwise the stream holds a single complete response.
    async fn generate_content(&self, request: LlmRequest, stream: bool)
    -> Result<LlmResponseStream>;
}

/// Drain a response stream into one model [`Content`].
///
/// Text increments are concatenated; function calls are kept in arrival order.
pub async fn collect_response(mut stream: LlmResponseStream) -> Result<Content> {
    let mut text = String::new();
    let mut calls = Vec::new();

    while let Some(item) = stream.next().await {
        let Some(content) = item?.content else { continue };
        for part in content.parts {
            match part {
                Part::Text { text: t } => text.push_str(&t),
                call @ Part::FunctionCall { .. } => calls.push(call),
                Part::FunctionResponse { .. } => {}
            }
        }
    }

    let mut merged = Content::new(ROLE_MODEL);
    if !text.is_empty() {
        merged.parts.push(Part::Text { text });
    }
    merged.parts.extend(calls);
    Ok(merged)
}
