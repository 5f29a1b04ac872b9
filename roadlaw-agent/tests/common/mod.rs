//! Shared fixtures: a keyword embedder, a ten-passage law collection, and a
//! scripted judge.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use roadlaw_agent::{EventStream, StreamEvent};
use roadlaw_core::{Content, LlmRequest, LlmResponse, Part};
use roadlaw_model::{MockLlm, MockTurn};
use roadlaw_rag::{
    Bm25SparseEmbedder, EmbeddingProvider, HybridRetriever, InMemoryVectorStore, LawPayload,
    LlmReranker, RagConfig, RagError, StoredPoint,
};

pub const COLLECTION: &str = "traffic_law_qa_system";

/// Bag-of-words embedding over a fixed vocabulary.
pub struct KeywordEmbedder;

const VOCABULARY: [&str; 12] =
    ["đèn", "đỏ", "tốc", "độ", "cồn", "mũ", "bảo", "hiểm", "xe", "giấy", "phép", "đăng"];

impl KeywordEmbedder {
    pub fn vector(text: &str) -> Vec<f32> {
        let lowered = text.to_lowercase();
        let words: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        VOCABULARY.iter().map(|v| words.iter().filter(|w| *w == v).count() as f32).collect()
    }
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    async fn embed(&self, text: &str) -> roadlaw_rag::Result<Vec<f32>> {
        Ok(Self::vector(text))
    }
}

/// An embedder whose backend is down.
pub struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed(&self, _text: &str) -> roadlaw_rag::Result<Vec<f32>> {
        Err(RagError::EmbeddingError {
            provider: "fixture".into(),
            message: "embedding service unavailable".into(),
        })
    }
}

/// The one passage about running a red light: Article 6 of the 2024 decree.
pub const MATCHING_ARTICLE: &str = "6";
pub const MATCHING_YEAR: &str = "2024";

/// One matching and nine non-matching passages.
pub fn law_fixture() -> Vec<LawPayload> {
    let mut passages = vec![LawPayload::new(
        MATCHING_YEAR,
        MATCHING_ARTICLE,
        "Xử phạt người điều khiển xe ô tô vi phạm quy tắc giao thông",
        "Phạt tiền từ 18.000.000 đồng đến 20.000.000 đồng đối với người lái xe vượt đèn đỏ, \
         không chấp hành hiệu lệnh của đèn tín hiệu giao thông",
    )];
    let others = [
        ("2019", "5", "Mũ bảo hiểm", "Không đội mũ bảo hiểm khi điều khiển xe mô tô"),
        ("2019", "8", "Nồng độ cồn", "Điều khiển xe khi trong hơi thở có nồng độ cồn"),
        ("2021", "9", "Tốc độ", "Điều khiển xe chạy quá tốc độ quy định từ 5 km/h"),
        ("2024", "11", "Giấy phép lái xe", "Không có giấy phép lái xe theo quy định"),
        ("2024", "12", "Đăng ký xe", "Không có giấy đăng ký xe theo quy định"),
        ("2021", "14", "Dừng đỗ xe", "Dừng xe, đỗ xe trên phần đường dành cho người đi bộ"),
        ("2019", "17", "Xe thô sơ", "Người điều khiển xe thô sơ đi vào đường cấm"),
        ("2024", "20", "Chở quá số người", "Chở theo từ 03 người trở lên trên xe"),
        ("2021", "23", "Bảo hiểm bắt buộc", "Không có bảo hiểm trách nhiệm dân sự bắt buộc"),
    ];
    passages.extend(
        others.into_iter().map(|(year, article, title, content)| LawPayload::new(year, article, title, content)),
    );
    passages
}

pub async fn store_with(payloads: Vec<LawPayload>) -> InMemoryVectorStore {
    let sparse = Bm25SparseEmbedder::new().unwrap();
    let store = InMemoryVectorStore::new();
    let points: Vec<StoredPoint> = payloads
        .into_iter()
        .enumerate()
        .map(|(i, payload)| StoredPoint {
            id: format!("p{i}"),
            dense: KeywordEmbedder::vector(&payload.content),
            sparse: sparse.embed_query(&payload.content).unwrap(),
            payload,
        })
        .collect();
    store.insert(COLLECTION, points).await;
    store
}

pub async fn retriever_over(payloads: Vec<LawPayload>) -> Arc<HybridRetriever> {
    let store = store_with(payloads).await;
    Arc::new(HybridRetriever::new(
        Arc::new(KeywordEmbedder),
        Arc::new(Bm25SparseEmbedder::new().unwrap()),
        Arc::new(store),
        RagConfig::default(),
    ))
}

pub async fn fixture_retriever() -> Arc<HybridRetriever> {
    retriever_over(law_fixture()).await
}

pub async fn failing_retriever() -> Arc<HybridRetriever> {
    let store = store_with(law_fixture()).await;
    Arc::new(HybridRetriever::new(
        Arc::new(FailingEmbedder),
        Arc::new(Bm25SparseEmbedder::new().unwrap()),
        Arc::new(store),
        RagConfig::default(),
    ))
}

/// Scores 9 for candidates mentioning a red light, 1 otherwise.
pub fn judge_turn(request: &LlmRequest) -> MockTurn {
    let prompt = request.contents.last().map(|c| c.text()).unwrap_or_default();
    let mut scores = serde_json::Map::new();
    for block in prompt.split("Document ID ").skip(1) {
        let Some((index, body)) = block.split_once(':') else { continue };
        let score = if body.contains("đèn đỏ") { 9.0 } else { 1.0 };
        scores.insert(index.trim().to_string(), serde_json::json!(score));
    }
    let body = serde_json::json!({"scores": scores, "rationale": "red-light passage matches"});
    MockTurn::Respond(vec![LlmResponse::text(body.to_string())])
}

pub fn judge() -> Arc<MockLlm> {
    Arc::new(MockLlm::new("judge-model").with_responder(judge_turn))
}

pub fn reranker(judge: Arc<MockLlm>) -> Arc<LlmReranker> {
    Arc::new(LlmReranker::new(judge))
}

pub async fn collect(stream: EventStream) -> Vec<StreamEvent> {
    stream.collect().await
}

/// The `(call id, body)` of a tool-result entry.
pub fn tool_response(content: &Content) -> Option<(String, String)> {
    content.parts.iter().find_map(|part| match part {
        Part::FunctionResponse { id, response, .. } => Some((id.clone(), response.clone())),
        _ => None,
    })
}

pub fn answers(events: &[StreamEvent]) -> Vec<&str> {
    events
        .iter()
        .filter_map(|e| match e {
            StreamEvent::Answer(text) => Some(text.as_str()),
            _ => None,
        })
        .collect()
}
