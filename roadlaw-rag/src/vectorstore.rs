//! Read-only vector store boundary used by the hybrid retriever.

use async_trait::async_trait;

use crate::document::{SearchHit, SparseVector};
use crate::error::Result;

/// Name of the dense named vector in the collection.
pub const DENSE_VECTOR_NAME: &str = "dense";
/// Name of the sparse named vector in the collection.
pub const SPARSE_VECTOR_NAME: &str = "sparse";

/// A collection of legal passages searchable by a dense and a sparse index.
///
/// Both searches return at most `limit` hits in the store's native order
/// (descending similarity), each carrying its full payload. Implementations
/// never write.
///
/// # Example
///
/// ```rust,ignore
/// use roadlaw_rag::{VectorStore, QdrantVectorStore};
///
/// let store = QdrantVectorStore::new("http://localhost:6334", None)?;
/// let dense = store.search_dense("traffic_law_qa_system", &embedding, 40).await?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// k-NN search against the dense index.
    async fn search_dense(
        &self,
        collection: &str,
        embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<SearchHit>>;

    /// k-NN search against the sparse index.
    async fn search_sparse(
        &self,
        collection: &str,
        vector: &SparseVector,
        limit: usize,
    ) -> Result<Vec<SearchHit>>;
}
