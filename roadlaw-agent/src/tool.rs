//! The retrieval tool exposed to the decision model.

use roadlaw_core::{FunctionCallRef, ToolDeclaration};
use serde_json::{Value, json};

use crate::error::{AgentError, Result};

/// Name the model uses to request retrieval.
pub const SEARCH_TOOL_NAME: &str = "search_traffic_law_db";

const SEARCH_TOOL_DESCRIPTION: &str = "Search the Vietnamese traffic law database. \
Use this tool when the user asks about:\n\
- fines for traffic violations (alcohol level, running red lights, speeding, ...)\n\
- driver's licences and vehicle registration\n\
- road traffic rules\n\
- Decrees 100/2019, 123/2021 and 168/2024 on penalties for traffic violations";

/// Every tool the decision model may call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    Search,
}

impl ToolKind {
    pub const ALL: [ToolKind; 1] = [ToolKind::Search];

    pub fn name(self) -> &'static str {
        match self {
            Self::Search => SEARCH_TOOL_NAME,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn declaration(self) -> ToolDeclaration {
        match self {
            Self::Search => ToolDeclaration {
                name: SEARCH_TOOL_NAME.to_string(),
                description: SEARCH_TOOL_DESCRIPTION.to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "Question or search keywords about traffic law"
                        }
                    },
                    "required": ["query"]
                }),
            },
        }
    }

    /// Declarations for every tool, in a fixed order.
    pub fn declarations() -> Vec<ToolDeclaration> {
        Self::ALL.into_iter().map(Self::declaration).collect()
    }
}

/// A validated tool request from the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    /// Correlates the tool result with this request.
    pub id: String,
    pub kind: ToolKind,
    pub args: Value,
}

impl ToolCall {
    /// Validate a raw function call. A missing call id is replaced by a
    /// generated one so the result can still be paired with the request.
    ///
    /// # Errors
    ///
    /// [`AgentError::Protocol`] for an unknown tool name or arguments
    /// without a non-empty `query` string.
    pub fn parse(call: FunctionCallRef<'_>) -> Result<Self> {
        let kind = ToolKind::from_name(call.name)
            .ok_or_else(|| AgentError::Protocol(format!("unknown tool '{}'", call.name)))?;

        match kind {
            ToolKind::Search => {
                let query = call.args.get("query").and_then(Value::as_str).map(str::trim);
                if query.is_none_or(str::is_empty) {
                    return Err(AgentError::Protocol(format!(
                        "tool '{}' called without a query: {}",
                        call.name, call.args
                    )));
                }
            }
        }

        let id = call
            .id
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("call_{}", uuid::Uuid::new_v4().simple()));
        Ok(Self { id, kind, args: call.args.clone() })
    }

    /// The search query. Present by construction for [`ToolKind::Search`].
    pub fn query(&self) -> &str {
        self.args.get("query").and_then(Value::as_str).map(str::trim).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call<'a>(id: Option<&'a str>, name: &'a str, args: &'a Value) -> FunctionCallRef<'a> {
        FunctionCallRef { id, name, args }
    }

    #[test]
    fn declaration_requires_query() {
        let decl = ToolKind::Search.declaration();
        assert_eq!(decl.name, "search_traffic_law_db");
        assert_eq!(decl.parameters["required"], json!(["query"]));
        assert!(decl.description.contains("168/2024"));
    }

    #[test]
    fn valid_call_parses() {
        let args = json!({"query": " vượt đèn đỏ "});
        let parsed = ToolCall::parse(call(Some("call_1"), SEARCH_TOOL_NAME, &args)).unwrap();
        assert_eq!(parsed.id, "call_1");
        assert_eq!(parsed.kind, ToolKind::Search);
        assert_eq!(parsed.query(), "vượt đèn đỏ");
    }

    #[test]
    fn missing_id_is_generated() {
        let args = json!({"query": "q"});
        let parsed = ToolCall::parse(call(None, SEARCH_TOOL_NAME, &args)).unwrap();
        assert!(parsed.id.starts_with("call_"));
    }

    #[test]
    fn unknown_tool_and_bad_args_are_protocol_errors() {
        let args = json!({"query": "q"});
        assert!(matches!(
            ToolCall::parse(call(Some("c"), "web_search", &args)),
            Err(AgentError::Protocol(_))
        ));
        let empty = json!({"query": "  "});
        assert!(ToolCall::parse(call(Some("c"), SEARCH_TOOL_NAME, &empty)).is_err());
        let raw = Value::String("{not json".into());
        assert!(ToolCall::parse(call(Some("c"), SEARCH_TOOL_NAME, &raw)).is_err());
    }
}
