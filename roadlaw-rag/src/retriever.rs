//! Hybrid dense + sparse retriever.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, instrument};

use crate::config::RagConfig;
use crate::document::Document;
use crate::embedding::{EmbeddingProvider, SparseEmbeddingProvider};
use crate::error::{RagError, Result};
use crate::fusion::reciprocal_rank_fusion;
use crate::vectorstore::VectorStore;

/// Retrieves candidate passages by querying the dense and the sparse index
/// concurrently and fusing both rankings.
///
/// The query is embedded once per call. Every external call is bounded by
/// [`RagConfig::search_timeout`]; expiry is reported as
/// [`RagError::Timeout`]. The retriever never writes to the store.
///
/// # Example
///
/// ```rust,ignore
/// let retriever = HybridRetriever::new(dense, sparse, store, RagConfig::default());
/// let docs = retriever.search("vượt đèn đỏ", 40).await?;
/// ```
pub struct HybridRetriever {
    dense: Arc<dyn EmbeddingProvider>,
    sparse: Arc<dyn SparseEmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    config: RagConfig,
}

impl HybridRetriever {
    pub fn new(
        dense: Arc<dyn EmbeddingProvider>,
        sparse: Arc<dyn SparseEmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        config: RagConfig,
    ) -> Self {
        Self { dense, sparse, store, config }
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return at most `limit` documents ordered by fused score.
    ///
    /// # Errors
    ///
    /// - [`RagError::ConfigError`] if `limit == 0`
    /// - any embedding, vector store or timeout error from either branch
    #[instrument(skip_all, fields(query_len = query.len(), limit = limit))]
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<Document>> {
        if limit == 0 {
            return Err(RagError::ConfigError("search limit must be greater than zero".into()));
        }
        let started = Instant::now();
        let bound = self.config.search_timeout;
        let collection = self.config.collection.as_str();

        let (dense_vector, sparse_vector) = tokio::try_join!(
            bounded("dense embedding", bound, self.dense.embed(query)),
            bounded("sparse embedding", bound, self.sparse.embed_sparse(query)),
        )?;

        let (dense_hits, sparse_hits) = tokio::try_join!(
            bounded("dense search", bound, self.store.search_dense(collection, &dense_vector, limit)),
            bounded("sparse search", bound, self.store.search_sparse(collection, &sparse_vector, limit)),
        )?;

        let dense_count = dense_hits.len();
        let sparse_count = sparse_hits.len();
        let documents =
            reciprocal_rank_fusion(&[dense_hits, sparse_hits], self.config.rank_constant, limit);

        info!(
            dense = dense_count,
            sparse = sparse_count,
            count = documents.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "hybrid search finished"
        );
        Ok(documents)
    }
}

/// Bound `fut` by `limit`, turning expiry into [`RagError::Timeout`].
async fn bounded<T, F>(operation: &str, limit: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::time::timeout(limit, fut).await.map_err(|_| RagError::Timeout {
        operation: operation.to_string(),
        seconds: limit.as_secs(),
    })?
}
