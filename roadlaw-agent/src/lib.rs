//! # roadlaw-agent
//!
//! Question answering over traffic law: the pipelines that compose
//! retrieval, reranking and generation and stream progress to the client.
//!
//! - [`FixedPipeline`] - always retrieve, rerank, generate
//! - [`AgenticPipeline`] - the model decides when to call the
//!   `search_traffic_law_db` tool, looping through retrieval and rerank
//! - [`AnswerGenerator`] - streams a grounded, cited answer
//!
//! Both pipelines implement [`Orchestrator`] and emit [`StreamEvent`]s:
//! `tool_name` / `tool_args` / `tool_content` triads for each step, then
//! cumulative `answer` events. A failed run ends with one apology `answer`.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use roadlaw_agent::{Components, PipelineConfig, build_orchestrator};
//!
//! let orchestrator = build_orchestrator(
//!     Components { llm, retriever, reranker },
//!     PipelineConfig::default(),
//! );
//! let mut events = orchestrator.process("Vượt đèn đỏ phạt bao nhiêu?".into(), Vec::new());
//! while let Some(event) = events.next().await {
//!     print!("{}", event.to_ndjson()?);
//! }
//! ```

pub mod agentic;
pub mod error;
pub mod event;
pub mod fixed;
pub mod generator;
pub mod orchestrator;
pub mod prompt;
pub mod state;
pub mod tool;

pub use agentic::{AgenticPipeline, Phase};
pub use error::{AgentError, Result};
pub use event::{ConversationTurn, EventStream, StreamEvent};
pub use fixed::FixedPipeline;
pub use generator::{AnswerGenerator, TextStream};
pub use orchestrator::{
    Components, NO_ANSWER_APOLOGY, Orchestrator, PIPELINE_APOLOGY, PipelineConfig, PipelineMode,
    build_orchestrator,
};
pub use state::{AgentState, ToolCallLogEntry};
pub use tool::{SEARCH_TOOL_NAME, ToolCall, ToolKind};
