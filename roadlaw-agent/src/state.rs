//! Loop-carried state of the agentic pipeline.
//!
//! [`AgentState`] is a plain value: each transition consumes the current
//! state and returns the next one, so nothing is shared between requests.

use std::collections::BTreeSet;

use roadlaw_core::{Content, ROLE_USER};
use roadlaw_rag::{Document, ScoredDocument};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::event::StreamEvent;

/// One tool invocation as shown to the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCallLogEntry {
    pub name: String,
    pub args: Value,
    pub content: String,
}

impl ToolCallLogEntry {
    pub fn new(name: impl Into<String>, args: Value, content: impl Into<String>) -> Self {
        Self { name: name.into(), args, content: content.into() }
    }

    /// The `tool_name` / `tool_args` / `tool_content` triad for this entry.
    pub fn events(&self) -> [StreamEvent; 3] {
        [
            StreamEvent::ToolName(self.name.clone()),
            StreamEvent::ToolArgs(self.args.clone()),
            StreamEvent::ToolContent(self.content.clone()),
        ]
    }
}

/// Conversation and tool bookkeeping threaded through the state machine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentState {
    /// Role-tagged conversation, system instruction first.
    pub messages: Vec<Content>,
    /// Raw retrieval results awaiting rerank.
    pub pending_search_results: Vec<Document>,
    /// Output of the most recent rerank.
    pub reranked_documents: Vec<ScoredDocument>,
    /// Append-only record of every tool invocation.
    pub tool_call_log: Vec<ToolCallLogEntry>,
    /// Id of the tool call whose result has not been sent back yet.
    pub last_tool_call_id: Option<String>,
    /// Completed retrieval cycles.
    pub cycles: usize,
}

impl AgentState {
    pub fn new(messages: Vec<Content>) -> Self {
        Self { messages, ..Self::default() }
    }

    pub fn with_message(mut self, message: Content) -> Self {
        self.messages.push(message);
        self
    }

    pub fn with_log_entry(mut self, entry: ToolCallLogEntry) -> Self {
        self.tool_call_log.push(entry);
        self
    }

    /// Record retrieval output for the call `tool_call_id`.
    pub fn with_search_results(mut self, tool_call_id: String, results: Vec<Document>) -> Self {
        self.pending_search_results = results;
        self.last_tool_call_id = Some(tool_call_id);
        self.cycles += 1;
        self
    }

    /// Take the pending results and call id, leaving neither behind.
    pub fn take_pending(mut self) -> (Self, Vec<Document>, Option<String>) {
        let results = std::mem::take(&mut self.pending_search_results);
        let call_id = self.last_tool_call_id.take();
        (self, results, call_id)
    }

    pub fn with_reranked(mut self, documents: Vec<ScoredDocument>) -> Self {
        self.reranked_documents = documents;
        self
    }

    /// Text of the most recent user message.
    pub fn last_user_query(&self) -> Option<String> {
        self.messages.iter().rev().find(|m| m.role == ROLE_USER).map(Content::text)
    }

    /// Events for log entries not yet in `sent`, marking them sent.
    pub fn unsent_events(&self, sent: &mut BTreeSet<usize>) -> Vec<StreamEvent> {
        self.tool_call_log
            .iter()
            .enumerate()
            .filter(|(index, _)| sent.insert(*index))
            .flat_map(|(_, entry)| entry.events())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn unsent_events_are_emitted_once() {
        let mut sent = BTreeSet::new();
        let state = AgentState::default()
            .with_log_entry(ToolCallLogEntry::new("a", json!({}), "x"));
        assert_eq!(state.unsent_events(&mut sent).len(), 3);
        assert!(state.unsent_events(&mut sent).is_empty());

        let state = state.with_log_entry(ToolCallLogEntry::new("b", json!({}), "y"));
        let events = state.unsent_events(&mut sent);
        assert_eq!(events[0], StreamEvent::ToolName("b".into()));
        assert_eq!(sent.len(), 2);
    }

    #[test]
    fn take_pending_clears_results_and_id() {
        let state = AgentState::default().with_search_results("call_1".into(), Vec::new());
        assert_eq!(state.cycles, 1);
        let (state, results, id) = state.take_pending();
        assert!(results.is_empty());
        assert_eq!(id.as_deref(), Some("call_1"));
        assert!(state.last_tool_call_id.is_none());
    }

    #[test]
    fn last_user_query_skips_other_roles() {
        let state = AgentState::new(vec![
            Content::system("s"),
            Content::user("câu hỏi"),
            Content::model("trả lời"),
        ]);
        assert_eq!(state.last_user_query().as_deref(), Some("câu hỏi"));
    }
}
