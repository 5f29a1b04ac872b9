//! Agentic pipeline: the model decides whether and how often to search.
//!
//! The run is a state machine over [`Phase`]:
//!
//! ```text
//! Agent ──tool call──▶ Tools ──▶ Rerank ──▶ Agent
//!   │
//!   └──plain text──▶ End
//! ```
//!
//! Every tool call the model makes is answered with exactly one tool result
//! before the model is called again.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_stream::stream;
use roadlaw_core::{Content, CoreError, GenerateConfig, Llm, LlmRequest, ROLE_MODEL, collect_response};
use roadlaw_rag::{HybridRetriever, Reranker};
use serde_json::json;
use tracing::{debug, error, info, instrument, warn};

use crate::error::{AgentError, Result};
use crate::event::{ConversationTurn, EventStream, StreamEvent};
use crate::fixed::{RERANK_STEP, found_message, selected_message};
use crate::orchestrator::{Components, NO_ANSWER_APOLOGY, Orchestrator, PipelineConfig, failure_answer};
use crate::prompt::{AGENT_SYSTEM_PROMPT, NO_DOCUMENTS_FOUND, history_contents, tool_result};
use crate::state::{AgentState, ToolCallLogEntry};
use crate::tool::{ToolCall, ToolKind};

/// Where the state machine is.
#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    /// Ask the model for its next move.
    Agent,
    /// Run the requested tool.
    Tools(ToolCall),
    /// Rerank captured results and answer the pending tool call.
    Rerank,
    /// Finished with this answer text.
    End(String),
}

/// Pipeline in which the model calls the retrieval tool as often as it needs,
/// up to [`PipelineConfig::max_agent_cycles`].
#[derive(Clone)]
pub struct AgenticPipeline {
    llm: Arc<dyn Llm>,
    retriever: Arc<HybridRetriever>,
    reranker: Arc<dyn Reranker>,
    config: PipelineConfig,
}

impl AgenticPipeline {
    pub fn new(components: Components, config: PipelineConfig) -> Self {
        Self {
            llm: components.llm,
            retriever: components.retriever,
            reranker: components.reranker,
            config,
        }
    }

    /// The opening conversation: instruction, replayed history, question.
    pub fn initial_state(query: &str, history: &[ConversationTurn]) -> AgentState {
        let mut messages = vec![Content::system(AGENT_SYSTEM_PROMPT)];
        messages.extend(history_contents(history));
        messages.push(Content::user(query));
        AgentState::new(messages)
    }

    /// Advance one transition.
    pub async fn step(&self, state: AgentState, phase: Phase) -> Result<(AgentState, Phase)> {
        match phase {
            Phase::Agent => self.agent(state).await,
            Phase::Tools(call) => self.tools(state, call).await,
            Phase::Rerank => Ok((self.rerank(state).await?, Phase::Agent)),
            Phase::End(answer) => Ok((state, Phase::End(answer))),
        }
    }

    #[instrument(skip_all, fields(messages = state.messages.len(), cycles = state.cycles))]
    async fn agent(&self, state: AgentState) -> Result<(AgentState, Phase)> {
        let request = LlmRequest::new(state.messages.clone())
            .with_tools(ToolKind::declarations())
            .with_config(GenerateConfig {
                temperature: Some(self.config.temperature),
                ..GenerateConfig::default()
            });

        let call = async {
            let stream = self.llm.generate_content(request, false).await?;
            collect_response(stream).await
        };
        let reply = tokio::time::timeout(self.config.llm_timeout, call).await.map_err(|_| {
            CoreError::Timeout {
                operation: format!("agent decision ({})", self.llm.name()),
                seconds: self.config.llm_timeout.as_secs(),
            }
        })??;

        let requested = reply.function_calls().count();
        let Some(raw) = reply.function_calls().next() else {
            let text = reply.text();
            debug!(answer_len = text.len(), "agent answered without tools");
            let state = state.with_message(Content::model(text.clone()));
            return Ok((state, Phase::End(text)));
        };

        if state.cycles >= self.config.max_agent_cycles {
            return Err(AgentError::Protocol(format!(
                "model requested retrieval again after {} cycles",
                state.cycles
            )));
        }
        if requested > 1 {
            warn!(requested, "model requested several tool calls, running only the first");
        }
        let call = ToolCall::parse(raw)?;

        let mut assistant = Content::new(ROLE_MODEL);
        let text = reply.text();
        if !text.is_empty() {
            assistant = assistant.with_text(text);
        }
        let assistant =
            assistant.with_function_call(Some(call.id.clone()), call.kind.name(), call.args.clone());
        Ok((state.with_message(assistant), Phase::Tools(call)))
    }

    #[instrument(skip_all, fields(tool.name = call.kind.name(), query_len = call.query().len()))]
    async fn tools(&self, state: AgentState, call: ToolCall) -> Result<(AgentState, Phase)> {
        match call.kind {
            ToolKind::Search => {
                let limit = self.retriever.config().hybrid_limit;
                let results = self.retriever.search(call.query(), limit).await?;
                info!(count = results.len(), "retrieval tool finished");

                let entry = ToolCallLogEntry::new(
                    call.kind.name(),
                    json!({"query": call.query()}),
                    found_message(results.len()),
                );
                let state = state.with_log_entry(entry).with_search_results(call.id, results);
                Ok((state, Phase::Rerank))
            }
        }
    }

    async fn rerank(&self, state: AgentState) -> Result<AgentState> {
        let (state, results, call_id) = state.take_pending();
        let Some(call_id) = call_id else {
            return Err(AgentError::Protocol("rerank reached without a pending tool call".into()));
        };

        if results.is_empty() {
            warn!("retrieval returned nothing, answering the tool call with an empty result");
            let message =
                Content::tool_response(call_id, ToolKind::Search.name(), NO_DOCUMENTS_FOUND);
            return Ok(state.with_message(message).with_reranked(Vec::new()));
        }

        let top_k = self.retriever.config().rerank_top_k;
        let query = state.last_user_query().unwrap_or_default();
        let documents = self.reranker.rerank(&query, results, top_k).await;

        let entry = ToolCallLogEntry::new(
            RERANK_STEP,
            json!({"model": self.reranker.model(), "top_k": top_k}),
            selected_message(documents.len()),
        );
        let message = Content::tool_response(call_id, ToolKind::Search.name(), tool_result(&documents));
        Ok(state.with_log_entry(entry).with_message(message).with_reranked(documents))
    }
}

impl Orchestrator for AgenticPipeline {
    fn process(&self, query: String, history: Vec<ConversationTurn>) -> EventStream {
        let this = self.clone();

        let output = stream! {
            info!(query_len = query.len(), history = history.len(), "agentic pipeline started");
            let mut state = Self::initial_state(&query, &history);
            let mut phase = Phase::Agent;
            let mut sent = BTreeSet::new();

            let answer = loop {
                if let Phase::End(answer) = phase {
                    break answer;
                }
                match this.step(state, phase).await {
                    Ok((next_state, next_phase)) => {
                        state = next_state;
                        phase = next_phase;
                    }
                    Err(e) => {
                        error!(error = %e, "agentic pipeline failed");
                        yield StreamEvent::Answer(failure_answer(&e));
                        return;
                    }
                }
                for event in state.unsent_events(&mut sent) {
                    yield event;
                }
            };

            if answer.trim().is_empty() {
                warn!(cycles = state.cycles, "agent finished without answer text");
                yield StreamEvent::Answer(NO_ANSWER_APOLOGY.to_string());
            } else {
                info!(cycles = state.cycles, answer_len = answer.len(), "agentic pipeline finished");
                yield StreamEvent::Answer(answer);
            }
        };
        Box::pin(output)
    }
}
