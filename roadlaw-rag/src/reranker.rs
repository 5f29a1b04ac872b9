//! Relevance reranking of retrieved passages.
//!
//! [`LlmReranker`] asks a language model to score every candidate against a
//! rubric in one JSON-mode call with fixed temperature and seed. Reranking
//! never fails outward: when the judging call errors, times out or returns
//! something unusable, the first `top_k` candidates are returned in their
//! retrieval order with a score of `0.0`.

use std::cmp::Ordering;
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use roadlaw_core::{Content, GenerateConfig, Llm, LlmRequest, ResponseFormat, collect_response};
use serde_json::{Map, Value};
use tracing::{debug, info, instrument, warn};

use crate::document::{Document, ScoredDocument};
use crate::error::{RagError, Result};

/// Highest score the rubric allows.
pub const MAX_SCORE: f32 = 10.0;

/// Seed used for judging calls unless overridden.
pub const DEFAULT_SEED: i64 = 13;

/// A reranker that re-scores and reorders retrieved documents.
///
/// Implementations absorb their own failures: the result always has
/// `min(top_k, documents.len())` entries sorted by `rerank_score` descending.
#[async_trait]
pub trait Reranker: Send + Sync {
    /// Identifier of the scoring model, reported in tool-call logs.
    fn model(&self) -> &str;

    async fn rerank(&self, query: &str, documents: Vec<Document>, top_k: usize)
    -> Vec<ScoredDocument>;
}

const RUBRIC: &str = r#"You are an expert in Vietnamese traffic law. Score how useful each provided legal document is for answering the user's query.

Assume every document is an authentic legal text. Judge only whether it helps answer this query.

Work through these steps:
1. Identify the legal issue in the query, the vehicle type and the subject it concerns.
2. For each document, check whether its content addresses that issue.
3. Weigh the document on these criteria:
   - Semantic match: does it explicitly cover the violation, rule or penalty asked about?
   - Contextual fit: does it match the vehicle type, road type and subject of the query?
   - Completeness: does it give the full answer (fine range, additional penalties) or only part of it?
   - Temporal validity: when several documents describe the same legal issue, the one from the most recent regulation year must score higher. Older provisions superseded by a newer decree are penalized.
4. Give each document a score from 0 to 10.

Respond with one JSON object of this shape, using the document ids as keys:
{"scores": {"0": 8.5, "1": 3.2}, "rationale": "one short paragraph"}"#;

/// A [`Reranker`] that scores candidates with one structured LLM call.
///
/// # Example
///
/// ```rust,ignore
/// let reranker = LlmReranker::new(Arc::new(OpenAIClient::new(config)?));
/// let top = reranker.rerank("vượt đèn đỏ", documents, 5).await;
/// ```
pub struct LlmReranker {
    llm: Arc<dyn Llm>,
    timeout: Duration,
    seed: i64,
}

impl LlmReranker {
    pub fn new(llm: Arc<dyn Llm>) -> Self {
        Self { llm, timeout: Duration::from_secs(60), seed: DEFAULT_SEED }
    }

    /// Bound on the judging call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_seed(mut self, seed: i64) -> Self {
        self.seed = seed;
        self
    }

    fn build_request(&self, query: &str, documents: &[Document]) -> LlmRequest {
        let mut listing = String::new();
        for (index, doc) in documents.iter().enumerate() {
            let p = &doc.payload;
            let _ = write!(
                listing,
                "Document ID {index}:\nYear: {}\nArticle: {}\nTitle: {}\nContent: {}\n\n",
                p.year, p.article, p.title, p.content
            );
        }
        let prompt = format!(
            "Query: \"{query}\"\n\nDocuments:\n{listing}Score every document and return only the JSON object."
        );

        LlmRequest::new(vec![Content::system(RUBRIC), Content::user(prompt)]).with_config(
            GenerateConfig::deterministic(self.seed).with_response_format(ResponseFormat::JsonObject),
        )
    }

    async fn judge(&self, query: &str, documents: &[Document]) -> Result<Vec<f32>> {
        let request = self.build_request(query, documents);
        let call = async {
            let stream = self.llm.generate_content(request, false).await?;
            collect_response(stream).await
        };
        let content = tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| RagError::Timeout {
                operation: format!("rerank ({})", self.llm.name()),
                seconds: self.timeout.as_secs(),
            })?
            .map_err(|e| RagError::RerankerError {
                reranker: self.llm.name().to_string(),
                message: e.to_string(),
            })?;
        parse_scores(&content.text(), documents.len()).map_err(|message| {
            RagError::RerankerError { reranker: self.llm.name().to_string(), message }
        })
    }
}

#[async_trait]
impl Reranker for LlmReranker {
    fn model(&self) -> &str {
        self.llm.name()
    }

    #[instrument(skip_all, fields(model = %self.llm.name(), candidates = documents.len(), top_k = top_k))]
    async fn rerank(
        &self,
        query: &str,
        documents: Vec<Document>,
        top_k: usize,
    ) -> Vec<ScoredDocument> {
        if documents.is_empty() || top_k == 0 {
            return Vec::new();
        }
        let started = Instant::now();

        match self.judge(query, &documents).await {
            Ok(scores) => {
                let ranked = rank_by_scores(documents, &scores, top_k);
                info!(
                    returned = ranked.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "rerank finished"
                );
                ranked
            }
            Err(e) => {
                warn!(error = %e, "rerank failed, keeping retrieval order with zero scores");
                fallback(documents, top_k)
            }
        }
    }
}

/// Attach `scores[i]` to document `i`, sort descending (stable) and keep `top_k`.
pub fn rank_by_scores(documents: Vec<Document>, scores: &[f32], top_k: usize) -> Vec<ScoredDocument> {
    let mut scored: Vec<ScoredDocument> = documents
        .into_iter()
        .enumerate()
        .map(|(i, document)| ScoredDocument {
            document,
            rerank_score: scores.get(i).copied().unwrap_or(0.0),
        })
        .collect();
    scored.sort_by(|a, b| b.rerank_score.partial_cmp(&a.rerank_score).unwrap_or(Ordering::Equal));
    scored.truncate(top_k);
    scored
}

/// The degraded result: first `top_k` documents, original order, score `0.0`.
pub fn fallback(documents: Vec<Document>, top_k: usize) -> Vec<ScoredDocument> {
    documents
        .into_iter()
        .take(top_k)
        .map(|document| ScoredDocument { document, rerank_score: 0.0 })
        .collect()
}

/// Parse a judging response into one score per document index.
///
/// Accepts `{"scores": {...}, "rationale": "..."}` or a bare mapping, with
/// an optional markdown code fence around it. For index `i` the key `"i"` is
/// tried first, then any key that reads as the integer `i`, then `"id_i"`.
/// A missing or non-numeric entry scores `0.0`; scores are clamped to
/// `[0, 10]`.
///
/// # Errors
///
/// Returns a description when the text is not a JSON object.
pub fn parse_scores(raw: &str, count: usize) -> std::result::Result<Vec<f32>, String> {
    let body = strip_code_fence(raw);
    let value: Value =
        serde_json::from_str(body).map_err(|e| format!("response is not valid JSON: {e}"))?;
    let Value::Object(root) = value else {
        return Err("response is not a JSON object".to_string());
    };

    if let Some(rationale) = root.get("rationale").and_then(Value::as_str) {
        debug!(rationale, "rerank rationale");
    }
    let map = match root.get("scores") {
        Some(Value::Object(scores)) => scores,
        Some(_) => return Err("\"scores\" is not an object".to_string()),
        None => &root,
    };

    Ok((0..count).map(|i| lookup(map, i).map(score_value).unwrap_or(0.0)).collect())
}

fn lookup(map: &Map<String, Value>, index: usize) -> Option<&Value> {
    map.get(&index.to_string())
        .or_else(|| {
            map.iter()
                .find(|(key, _)| key.trim().parse::<i64>().ok() == Some(index as i64))
                .map(|(_, value)| value)
        })
        .or_else(|| map.get(&format!("id_{index}")))
}

fn score_value(value: &Value) -> f32 {
    let raw = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match raw {
        Some(score) if score.is_finite() => (score as f32).clamp(0.0, MAX_SCORE),
        _ => 0.0,
    }
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
