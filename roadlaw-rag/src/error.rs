//! Error types for the `roadlaw-rag` crate.

use thiserror::Error;

/// Errors that can occur in retrieval and reranking.
#[derive(Debug, Error)]
pub enum RagError {
    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector store backend.
    #[error("Vector store error ({backend}): {message}")]
    VectorStoreError {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// The judging call failed or returned an unusable structure.
    #[error("Reranker error ({reranker}): {message}")]
    RerankerError {
        /// The reranker that produced the error.
        reranker: String,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An external call exceeded its bound.
    #[error("Timed out after {seconds}s waiting for {operation}")]
    Timeout {
        /// The operation that timed out.
        operation: String,
        /// The configured bound in seconds.
        seconds: u64,
    },

    /// An error propagated from `roadlaw-core`.
    #[error(transparent)]
    Core(#[from] roadlaw_core::CoreError),
}

impl RagError {
    /// Whether this error means retrieval itself failed (embedding, vector
    /// store or an expired bound on either), as opposed to a local fault.
    pub fn is_retrieval_failure(&self) -> bool {
        matches!(
            self,
            Self::EmbeddingError { .. } | Self::VectorStoreError { .. } | Self::Timeout { .. }
        )
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retrieval_failures_are_classified() {
        let store = RagError::VectorStoreError { backend: "qdrant".into(), message: "down".into() };
        let timeout = RagError::Timeout { operation: "dense search".into(), seconds: 15 };
        assert!(store.is_retrieval_failure());
        assert!(timeout.is_retrieval_failure());
        assert!(!RagError::ConfigError("limit".into()).is_retrieval_failure());
    }
}
