//! # roadlaw-rag
//!
//! Retrieval and reranking over Vietnamese traffic-law passages.
//!
//! - [`HybridRetriever`] - embeds the query once, searches the dense and the
//!   sparse index concurrently and fuses both rankings with
//!   [`reciprocal_rank_fusion`]
//! - [`LlmReranker`] - scores candidates with one deterministic JSON-mode LLM
//!   call and falls back to retrieval order when scoring fails
//! - [`Bm25SparseEmbedder`] - local query embedding for a `Qdrant/bm25` index
//! - [`InMemoryVectorStore`] and, behind the `qdrant` feature,
//!   `QdrantVectorStore`
//!
//! ## Features
//!
//! - `openai` - `OpenAIEmbeddingProvider` for OpenAI-compatible `/embeddings`
//! - `qdrant` - `QdrantVectorStore`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use roadlaw_rag::{Bm25SparseEmbedder, HybridRetriever, LlmReranker, RagConfig, Reranker};
//!
//! let retriever = HybridRetriever::new(
//!     Arc::new(dense_provider),
//!     Arc::new(Bm25SparseEmbedder::new()?),
//!     Arc::new(store),
//!     RagConfig::default(),
//! );
//! let candidates = retriever.search("vượt đèn đỏ phạt bao nhiêu", 40).await?;
//! let top = LlmReranker::new(llm).rerank("vượt đèn đỏ phạt bao nhiêu", candidates, 5).await;
//! ```

pub mod bm25;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod fusion;
pub mod inmemory;
#[cfg(feature = "openai")]
pub mod openai;
#[cfg(feature = "qdrant")]
pub mod qdrant;
pub mod reranker;
pub mod retriever;
pub mod vectorstore;

pub use bm25::Bm25SparseEmbedder;
pub use config::{DEFAULT_COLLECTION, RagConfig, RagConfigBuilder};
pub use document::{Document, LawPayload, ScoredDocument, SearchHit, SparseVector};
pub use embedding::{EmbeddingProvider, SparseEmbeddingProvider};
pub use error::{RagError, Result};
pub use fusion::reciprocal_rank_fusion;
pub use inmemory::{InMemoryVectorStore, StoredPoint};
#[cfg(feature = "openai")]
pub use openai::OpenAIEmbeddingProvider;
#[cfg(feature = "qdrant")]
pub use qdrant::QdrantVectorStore;
pub use reranker::{LlmReranker, Reranker};
pub use retriever::HybridRetriever;
pub use vectorstore::{DENSE_VECTOR_NAME, SPARSE_VECTOR_NAME, VectorStore};
