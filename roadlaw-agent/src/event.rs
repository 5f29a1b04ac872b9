//! Events streamed to the client, one JSON object per line.

use std::pin::Pin;

use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One progress or result event.
///
/// Serialized as `{"type": "<variant>", "content": ...}`. `Answer` carries
/// the whole answer so far; each one replaces the previous.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "content", rename_all = "snake_case")]
pub enum StreamEvent {
    ToolName(String),
    ToolArgs(Value),
    ToolContent(String),
    Answer(String),
}

impl StreamEvent {
    /// The event as one NDJSON line, newline included.
    pub fn to_ndjson(&self) -> serde_json::Result<String> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }

    pub fn is_answer(&self) -> bool {
        matches!(self, Self::Answer(_))
    }
}

/// Lazily produced pipeline output. Failures arrive as a terminal
/// [`StreamEvent::Answer`], so the stream itself is infallible.
pub type EventStream = Pin<Box<dyn Stream<Item = StreamEvent> + Send>>;

/// One past exchange. A history is ordered oldest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversationTurn {
    pub query: String,
    pub response: String,
}
