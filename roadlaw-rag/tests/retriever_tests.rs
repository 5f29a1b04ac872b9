//! Hybrid retriever over the in-memory store.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use roadlaw_rag::{
    Bm25SparseEmbedder, EmbeddingProvider, HybridRetriever, InMemoryVectorStore, LawPayload,
    RagConfig, RagError, SearchHit, SparseVector, StoredPoint, VectorStore,
};

const COLLECTION: &str = "traffic_law_qa_system";

/// Bag-of-words embedding over a fixed vocabulary.
struct KeywordEmbedder {
    vocabulary: Vec<&'static str>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl KeywordEmbedder {
    fn new() -> Self {
        Self {
            vocabulary: vec!["đèn", "đỏ", "tốc", "độ", "nồng", "cồn", "mũ", "bảo", "hiểm", "xe"],
            calls: AtomicUsize::new(0),
            delay: None,
        }
    }

    fn vector(&self, text: &str) -> Vec<f32> {
        let lowered = text.to_lowercase();
        let words: Vec<&str> = lowered.split_whitespace().collect();
        self.vocabulary
            .iter()
            .map(|v| words.iter().filter(|w| w.trim_matches(|c: char| !c.is_alphanumeric()) == *v).count() as f32)
            .collect()
    }
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    async fn embed(&self, text: &str) -> roadlaw_rag::Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.vector(text))
    }
}

fn passages() -> Vec<(&'static str, &'static str, &'static str)> {
    vec![
        ("6", "Xử phạt người điều khiển xe ô tô", "Phạt tiền đối với hành vi không chấp hành hiệu lệnh của đèn tín hiệu giao thông, vượt đèn đỏ"),
        ("7", "Xử phạt người điều khiển xe mô tô", "Không đội mũ bảo hiểm khi điều khiển xe"),
        ("8", "Vi phạm nồng độ cồn", "Điều khiển xe trên đường mà trong máu hoặc hơi thở có nồng độ cồn"),
        ("9", "Vi phạm tốc độ", "Điều khiển xe chạy quá tốc độ quy định"),
    ]
}

async fn fixture_store(embedder: &KeywordEmbedder, sparse: &Bm25SparseEmbedder) -> InMemoryVectorStore {
    let store = InMemoryVectorStore::new();
    let points = passages().into_iter().map(|(article, title, content)| StoredPoint {
        id: format!("p{article}"),
        payload: LawPayload::new("2024", article, title, content),
        dense: embedder.vector(content),
        sparse: sparse.embed_query(content).unwrap(),
    });
    store.insert(COLLECTION, points).await;
    store
}

async fn retriever(dense: KeywordEmbedder, config: RagConfig) -> (HybridRetriever, Arc<KeywordEmbedder>) {
    let sparse = Bm25SparseEmbedder::new().unwrap();
    let store = fixture_store(&dense, &sparse).await;
    let dense = Arc::new(dense);
    let retriever = HybridRetriever::new(dense.clone(), Arc::new(sparse), Arc::new(store), config);
    (retriever, dense)
}

#[tokio::test]
async fn matching_passage_ranks_first() {
    let (retriever, dense) = retriever(KeywordEmbedder::new(), RagConfig::default()).await;

    let docs = retriever.search("Lái xe vượt đèn đỏ phạt bao nhiêu tiền", 3).await.unwrap();

    assert_eq!(docs.len(), 3);
    assert_eq!(docs[0].id, "p6");
    assert_eq!(docs[0].payload.article, "6");
    assert!(docs.windows(2).all(|w| w[0].hybrid_score >= w[1].hybrid_score));
    assert_eq!(dense.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn zero_limit_is_rejected() {
    let (retriever, _) = retriever(KeywordEmbedder::new(), RagConfig::default()).await;
    let err = retriever.search("q", 0).await.unwrap_err();
    assert!(matches!(err, RagError::ConfigError(_)));
}

#[tokio::test]
async fn missing_collection_surfaces_as_retrieval_failure() {
    let config = RagConfig::builder().collection("other").build().unwrap();
    let (retriever, _) = retriever(KeywordEmbedder::new(), config).await;
    let err = retriever.search("đèn đỏ", 5).await.unwrap_err();
    assert!(err.is_retrieval_failure(), "{err}");
}

#[tokio::test(start_paused = true)]
async fn slow_embedding_times_out() {
    let slow = KeywordEmbedder { delay: Some(Duration::from_secs(30)), ..KeywordEmbedder::new() };
    let config = RagConfig::builder().search_timeout(Duration::from_secs(2)).build().unwrap();
    let (retriever, _) = retriever(slow, config).await;

    let err = retriever.search("đèn đỏ", 5).await.unwrap_err();
    assert!(matches!(err, RagError::Timeout { .. }), "{err}");
    assert!(err.is_retrieval_failure());
}

/// Delays every search by a fixed amount before delegating.
struct SlowStore {
    inner: InMemoryVectorStore,
    delay: Duration,
}

#[async_trait]
impl VectorStore for SlowStore {
    async fn search_dense(
        &self,
        collection: &str,
        embedding: &[f32],
        limit: usize,
    ) -> roadlaw_rag::Result<Vec<SearchHit>> {
        tokio::time::sleep(self.delay).await;
        self.inner.search_dense(collection, embedding, limit).await
    }

    async fn search_sparse(
        &self,
        collection: &str,
        vector: &SparseVector,
        limit: usize,
    ) -> roadlaw_rag::Result<Vec<SearchHit>> {
        tokio::time::sleep(self.delay).await;
        self.inner.search_sparse(collection, vector, limit).await
    }
}

#[tokio::test(start_paused = true)]
async fn dense_and_sparse_searches_overlap() {
    let dense = KeywordEmbedder::new();
    let sparse = Bm25SparseEmbedder::new().unwrap();
    let store = SlowStore { inner: fixture_store(&dense, &sparse).await, delay: Duration::from_secs(4) };
    let config = RagConfig::builder().search_timeout(Duration::from_secs(6)).build().unwrap();
    let retriever = HybridRetriever::new(Arc::new(dense), Arc::new(sparse), Arc::new(store), config);

    let started = tokio::time::Instant::now();
    let docs = retriever.search("vượt đèn đỏ", 3).await.unwrap();
    let elapsed = started.elapsed();

    assert_eq!(docs[0].id, "p6");
    assert!(elapsed >= Duration::from_secs(4), "{elapsed:?}");
    assert!(elapsed < Duration::from_secs(8), "searches ran back to back: {elapsed:?}");
}
