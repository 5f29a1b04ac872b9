//! Role-tagged conversation entries exchanged with a language model.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Role of the instruction entry that precedes a conversation.
pub const ROLE_SYSTEM: &str = "system";
/// Role of end-user entries.
pub const ROLE_USER: &str = "user";
/// Role of entries produced by the model.
pub const ROLE_MODEL: &str = "model";
/// Role of entries carrying a tool result back to the model.
pub const ROLE_TOOL: &str = "tool";

/// One piece of a [`Content`] entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Part {
    /// Plain text.
    Text { text: String },
    /// A request from the model to invoke a named tool.
    FunctionCall {
        /// Provider-assigned call id, echoed back by the matching response.
        id: Option<String>,
        name: String,
        args: Value,
    },
    /// The result of a tool invocation, correlated by `id`.
    FunctionResponse { id: String, name: String, response: String },
}

/// A role-tagged conversation entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

impl Content {
    /// Create an empty entry for `role`.
    pub fn new(role: impl Into<String>) -> Self {
        Self { role: role.into(), parts: Vec::new() }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(ROLE_SYSTEM).with_text(text)
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(ROLE_USER).with_text(text)
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self::new(ROLE_MODEL).with_text(text)
    }

    /// A tool-result entry answering the call identified by `call_id`.
    pub fn tool_response(
        call_id: impl Into<String>,
        name: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        Self {
            role: ROLE_TOOL.to_string(),
            parts: vec![Part::FunctionResponse {
                id: call_id.into(),
                name: name.into(),
                response: response.into(),
            }],
        }
    }

    /// Append a text part.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.parts.push(Part::Text { text: text.into() });
        self
    }

    /// Append a function-call part.
    pub fn with_function_call(
        mut self,
        id: Option<String>,
        name: impl Into<String>,
        args: Value,
    ) -> Self {
        self.parts.push(Part::FunctionCall { id, name: name.into(), args });
        self
    }

    /// Concatenated text of all text parts.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                Part::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Function calls carried by this entry, in order.
    pub fn function_calls(&self) -> impl Iterator<Item = FunctionCallRef<'_>> {
        self.parts.iter().filter_map(|part| match part {
            Part::FunctionCall { id, name, args } => {
                Some(FunctionCallRef { id: id.as_deref(), name, args })
            }
            _ => None,
        })
    }

    pub fn has_function_calls(&self) -> bool {
        self.function_calls().next().is_some()
    }
}

/// Borrowed view of a [`Part::FunctionCall`].
#[derive(Debug, Clone, Copy)]
pub struct FunctionCallRef<'a> {
    pub id: Option<&'a str>,
    pub name: &'a str,
    pub args: &'a Value,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn text_skips_non_text_parts() {
        let content = Content::model("xin ")
            .with_function_call(Some("call_1".into()), "search", json!({"query": "q"}))
            .with_text("chào");
        assert_eq!(content.text(), "xin chào");
        assert!(content.has_function_calls());
    }

    #[test]
    fn tool_response_carries_call_id() {
        let content = Content::tool_response("call_7", "search", "ok");
        assert_eq!(content.role, ROLE_TOOL);
        match &content.parts[0] {
            Part::FunctionResponse { id, .. } => assert_eq!(id, "call_7"),
            other => panic!("unexpected part {other:?}"),
        }
    }
}
