//! Conversion between roadlaw types and async-openai chat-completions types.

use std::collections::BTreeMap;

use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionMessageToolCallChunk,
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestAssistantMessageContent,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestSystemMessageContent, ChatCompletionRequestToolMessageArgs,
    ChatCompletionRequestToolMessageContent, ChatCompletionRequestUserMessageArgs,
    ChatCompletionRequestUserMessageContent, ChatCompletionTool, ChatCompletionToolArgs,
    ChatCompletionToolType, CreateChatCompletionRequest, CreateChatCompletionRequestArgs,
    CreateChatCompletionResponse, FinishReason as WireFinishReason, FunctionCall,
    FunctionObjectArgs, ResponseFormat as WireResponseFormat,
};
use roadlaw_core::{
    Content, FinishReason, LlmRequest, LlmResponse, Part, ROLE_MODEL, ResponseFormat,
    ToolDeclaration,
};
use serde_json::Value;

/// Build the chat-completions request for `request` against `model`.
#[allow(deprecated)] // `max_tokens` is still what compatible servers read.
pub(crate) fn build_request(
    model: &str,
    request: &LlmRequest,
) -> Result<CreateChatCompletionRequest, OpenAIError> {
    let mut messages = Vec::with_capacity(request.contents.len());
    for content in &request.contents {
        messages.extend(content_to_messages(content)?);
    }

    let mut builder = CreateChatCompletionRequestArgs::default();
    builder.model(model).messages(messages);

    if !request.tools.is_empty() {
        let tools = request.tools.iter().map(convert_tool).collect::<Result<Vec<_>, _>>()?;
        builder.tools(tools);
    }

    let config = &request.config;
    if let Some(temperature) = config.temperature {
        builder.temperature(temperature);
    }
    if let Some(seed) = config.seed {
        builder.seed(seed);
    }
    if let Some(max_tokens) = config.max_output_tokens {
        builder.max_tokens(max_tokens);
    }
    if let ResponseFormat::JsonObject = config.response_format {
        builder.response_format(WireResponseFormat::JsonObject);
    }

    builder.build()
}

/// Convert one [`Content`] into request messages.
///
/// A tool entry may carry several responses; each becomes its own tool
/// message since the API pairs one message with one call id.
pub(crate) fn content_to_messages(
    content: &Content,
) -> Result<Vec<ChatCompletionRequestMessage>, OpenAIError> {
    match content.role.as_str() {
        "system" => {
            let message = ChatCompletionRequestSystemMessageArgs::default()
                .content(ChatCompletionRequestSystemMessageContent::Text(content.text()))
                .build()?;
            Ok(vec![message.into()])
        }
        "tool" | "function" => content
            .parts
            .iter()
            .filter_map(|part| match part {
                Part::FunctionResponse { id, response, .. } => Some((id, response)),
                _ => None,
            })
            .map(|(id, response)| -> Result<ChatCompletionRequestMessage, OpenAIError> {
                let message = ChatCompletionRequestToolMessageArgs::default()
                    .content(ChatCompletionRequestToolMessageContent::Text(response.clone()))
                    .tool_call_id(id.clone())
                    .build()?;
                Ok(message.into())
            })
            .collect(),
        "model" | "assistant" => {
            let tool_calls: Vec<ChatCompletionMessageToolCall> = content
                .function_calls()
                .enumerate()
                .map(|(index, call)| ChatCompletionMessageToolCall {
                    id: call.id.map(str::to_string).unwrap_or_else(|| format!("call_{index}")),
                    r#type: ChatCompletionToolType::Function,
                    function: FunctionCall {
                        name: call.name.to_string(),
                        arguments: call.args.to_string(),
                    },
                })
                .collect();

            let text = content.text();
            let mut builder = ChatCompletionRequestAssistantMessageArgs::default();
            if !text.is_empty() || tool_calls.is_empty() {
                builder.content(ChatCompletionRequestAssistantMessageContent::Text(text));
            }
            if !tool_calls.is_empty() {
                builder.tool_calls(tool_calls);
            }
            Ok(vec![builder.build()?.into()])
        }
        _ => {
            let message = ChatCompletionRequestUserMessageArgs::default()
                .content(ChatCompletionRequestUserMessageContent::Text(content.text()))
                .build()?;
            Ok(vec![message.into()])
        }
    }
}

fn convert_tool(tool: &ToolDeclaration) -> Result<ChatCompletionTool, OpenAIError> {
    let function = FunctionObjectArgs::default()
        .name(tool.name.clone())
        .description(tool.description.clone())
        .parameters(tool.parameters.clone())
        .build()?;
    ChatCompletionToolArgs::default().r#type(ChatCompletionToolType::Function).function(function).build()
}

pub(crate) fn parse_finish_reason(reason: Option<WireFinishReason>) -> Option<FinishReason> {
    reason.map(|r| match r {
        WireFinishReason::Stop => FinishReason::Stop,
        WireFinishReason::Length => FinishReason::Length,
        WireFinishReason::ToolCalls => FinishReason::ToolCalls,
        WireFinishReason::ContentFilter => FinishReason::ContentFilter,
        _ => FinishReason::Other,
    })
}

/// Arguments arrive JSON-encoded; a body that does not parse is kept as a
/// raw string so the caller can report it.
fn parse_arguments(raw: &str) -> Value {
    if raw.trim().is_empty() {
        return Value::Object(serde_json::Map::new());
    }
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Convert a complete (non-streaming) response.
pub(crate) fn from_completion(response: CreateChatCompletionResponse) -> LlmResponse {
    let Some(choice) = response.choices.into_iter().next() else {
        return LlmResponse { turn_complete: true, ..LlmResponse::default() };
    };

    let mut content = Content::new(ROLE_MODEL);
    if let Some(text) = choice.message.content.filter(|t| !t.is_empty()) {
        content = content.with_text(text);
    }
    for call in choice.message.tool_calls.unwrap_or_default() {
        content = content.with_function_call(
            Some(call.id),
            call.function.name,
            parse_arguments(&call.function.arguments),
        );
    }

    LlmResponse {
        content: Some(content),
        partial: false,
        turn_complete: true,
        finish_reason: parse_finish_reason(choice.finish_reason),
    }
}

/// Reassembles tool calls whose name and arguments are split across chunks.
#[derive(Debug, Default)]
pub(crate) struct ToolCallAccumulator {
    calls: BTreeMap<u32, PendingCall>,
}

#[derive(Debug, Default)]
struct PendingCall {
    id: Option<String>,
    name: String,
    arguments: String,
}

impl ToolCallAccumulator {
    pub fn push(&mut self, chunks: Vec<ChatCompletionMessageToolCallChunk>) {
        for chunk in chunks {
            let pending = self.calls.entry(chunk.index).or_default();
            if let Some(id) = chunk.id {
                pending.id = Some(id);
            }
            if let Some(function) = chunk.function {
                if let Some(name) = function.name {
                    pending.name.push_str(&name);
                }
                if let Some(arguments) = function.arguments {
                    pending.arguments.push_str(&arguments);
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// The completed calls as a model [`Content`], in index order.
    pub fn finish(self) -> Content {
        self.calls.into_values().fold(Content::new(ROLE_MODEL), |content, call| {
            content.with_function_call(call.id, call.name, parse_arguments(&call.arguments))
        })
    }
}
