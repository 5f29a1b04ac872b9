//! Fixed pipeline: always retrieve, rerank, then generate.

use std::sync::Arc;

use async_stream::stream;
use futures::StreamExt;
use roadlaw_rag::{HybridRetriever, Reranker};
use serde_json::json;
use tracing::{error, info, warn};

use crate::event::{ConversationTurn, EventStream, StreamEvent};
use crate::generator::AnswerGenerator;
use crate::orchestrator::{NO_ANSWER_APOLOGY, Orchestrator, failure_answer};

/// Tool name reported for the retrieval step.
pub const HYBRID_SEARCH_STEP: &str = "hybrid_search";
/// Tool name reported for the rerank step.
pub const RERANK_STEP: &str = "rerank";

/// Retrieval and rerank progress text.
pub(crate) fn found_message(count: usize) -> String {
    format!("Tìm thấy {count} kết quả")
}

pub(crate) fn selected_message(count: usize) -> String {
    format!("Đã chọn top {count} tài liệu liên quan nhất")
}

/// Deterministic retrieve → rerank → generate pipeline.
///
/// Emits the retrieval triad, the rerank triad, then one cumulative
/// `answer` event per generated increment.
#[derive(Clone)]
pub struct FixedPipeline {
    retriever: Arc<HybridRetriever>,
    reranker: Arc<dyn Reranker>,
    generator: AnswerGenerator,
}

impl FixedPipeline {
    pub fn new(
        retriever: Arc<HybridRetriever>,
        reranker: Arc<dyn Reranker>,
        generator: AnswerGenerator,
    ) -> Self {
        Self { retriever, reranker, generator }
    }
}

impl Orchestrator for FixedPipeline {
    fn process(&self, query: String, history: Vec<ConversationTurn>) -> EventStream {
        let this = self.clone();

        let output = stream! {
            info!(query_len = query.len(), history = history.len(), "fixed pipeline started");
            let limit = this.retriever.config().hybrid_limit;
            let top_k = this.retriever.config().rerank_top_k;

            yield StreamEvent::ToolName(HYBRID_SEARCH_STEP.to_string());
            yield StreamEvent::ToolArgs(json!({"query": query, "limit": limit}));
            let candidates = match this.retriever.search(&query, limit).await {
                Ok(candidates) => candidates,
                Err(e) => {
                    error!(error = %e, "retrieval failed");
                    yield StreamEvent::Answer(failure_answer(&e));
                    return;
                }
            };
            yield StreamEvent::ToolContent(found_message(candidates.len()));

            yield StreamEvent::ToolName(RERANK_STEP.to_string());
            yield StreamEvent::ToolArgs(json!({"model": this.reranker.model(), "top_k": top_k}));
            let documents = this.reranker.rerank(&query, candidates, top_k).await;
            yield StreamEvent::ToolContent(selected_message(documents.len()));

            let mut answer = String::new();
            let mut fragments = this.generator.generate(&query, &history, &documents);
            while let Some(fragment) = fragments.next().await {
                answer.push_str(&fragment);
                yield StreamEvent::Answer(answer.clone());
            }
            if answer.is_empty() {
                warn!("generator produced no text");
                yield StreamEvent::Answer(NO_ANSWER_APOLOGY.to_string());
            }
            info!(answer_len = answer.len(), documents = documents.len(), "fixed pipeline finished");
        };
        Box::pin(output)
    }
}
