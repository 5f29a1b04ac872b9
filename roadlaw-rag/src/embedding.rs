//! Embedding provider traits for turning query text into vectors.

use async_trait::async_trait;

use crate::document::SparseVector;
use crate::error::Result;

/// A provider that generates dense vector embeddings from text input.
///
/// Implementations wrap specific embedding backends behind a unified async
/// interface. Only queries are embedded at request time; passages were
/// embedded at ingestion.
///
/// # Example
///
/// ```rust,ignore
/// use roadlaw_rag::EmbeddingProvider;
///
/// let embedding = provider.embed("vượt đèn đỏ").await?;
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// A provider that turns query text into a sparse term vector.
///
/// Must be a pure function of its input and agree with the term space the
/// indexed documents were embedded into.
#[async_trait]
pub trait SparseEmbeddingProvider: Send + Sync {
    async fn embed_sparse(&self, text: &str) -> Result<SparseVector>;
}
