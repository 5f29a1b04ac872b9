//! The pipeline seam used by the HTTP layer.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use roadlaw_core::Llm;
use roadlaw_rag::{HybridRetriever, Reranker};
use serde::{Deserialize, Serialize};

use crate::agentic::AgenticPipeline;
use crate::event::{ConversationTurn, EventStream};
use crate::fixed::FixedPipeline;
use crate::generator::AnswerGenerator;

/// Apology prefix for a run that failed before it could answer.
pub const PIPELINE_APOLOGY: &str = "Xin lỗi, đã có lỗi xảy ra";

/// Answer sent when a run ends without any answer text.
pub const NO_ANSWER_APOLOGY: &str =
    "Xin lỗi, đã có lỗi xảy ra trong quá trình xử lý yêu cầu của bạn.";

/// Turns one question into a stream of progress and answer events.
///
/// Implementations are constructed once and shared across requests; all
/// per-request state lives inside the returned stream, which does no work
/// until polled and stops all upstream calls when dropped.
pub trait Orchestrator: Send + Sync {
    fn process(&self, query: String, history: Vec<ConversationTurn>) -> EventStream;
}

/// Which orchestration strategy serves requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineMode {
    /// The model decides per turn whether to search.
    #[default]
    Agentic,
    /// Always retrieve, rerank, then generate.
    Fixed,
}

impl FromStr for PipelineMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "agentic" | "agent" => Ok(Self::Agentic),
            "fixed" | "rag" => Ok(Self::Fixed),
            other => Err(format!("unknown pipeline mode '{other}' (expected agentic or fixed)")),
        }
    }
}

impl fmt::Display for PipelineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Agentic => "agentic",
            Self::Fixed => "fixed",
        })
    }
}

/// Settings shared by both pipelines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub mode: PipelineMode,
    /// Retrieval cycles the agent may start in one run.
    pub max_agent_cycles: usize,
    /// Bound on each decision call.
    pub llm_timeout: Duration,
    /// Bound on opening the answer stream and on each increment.
    pub stream_idle_timeout: Duration,
    pub temperature: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            mode: PipelineMode::Agentic,
            max_agent_cycles: 3,
            llm_timeout: Duration::from_secs(60),
            stream_idle_timeout: Duration::from_secs(30),
            temperature: 0.0,
        }
    }
}

/// Shared components, constructed once at startup.
#[derive(Clone)]
pub struct Components {
    /// Chat model used for decisions and answers.
    pub llm: Arc<dyn Llm>,
    pub retriever: Arc<HybridRetriever>,
    pub reranker: Arc<dyn Reranker>,
}

/// Build the orchestrator selected by `config.mode`.
pub fn build_orchestrator(components: Components, config: PipelineConfig) -> Arc<dyn Orchestrator> {
    match config.mode {
        PipelineMode::Agentic => Arc::new(AgenticPipeline::new(components, config)),
        PipelineMode::Fixed => {
            let generator = AnswerGenerator::new(Arc::clone(&components.llm))
                .with_temperature(config.temperature)
                .with_timeout(config.stream_idle_timeout);
            Arc::new(FixedPipeline::new(components.retriever, components.reranker, generator))
        }
    }
}

/// The terminal answer for a failed run.
pub(crate) fn failure_answer(error: &dyn fmt::Display) -> String {
    format!("{PIPELINE_APOLOGY}: {error}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_parses_case_insensitively() {
        assert_eq!("Fixed".parse::<PipelineMode>().unwrap(), PipelineMode::Fixed);
        assert_eq!(" agentic ".parse::<PipelineMode>().unwrap(), PipelineMode::Agentic);
        assert!("graph".parse::<PipelineMode>().is_err());
    }

    #[test]
    fn defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.mode, PipelineMode::Agentic);
        assert_eq!(config.max_agent_cycles, 3);
        assert_eq!(config.mode.to_string(), "agentic");
    }
}
