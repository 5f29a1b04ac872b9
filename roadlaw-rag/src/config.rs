//! Configuration for retrieval and reranking.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Name of the collection the ingestion job writes legal passages to.
pub const DEFAULT_COLLECTION: &str = "traffic_law_qa_system";

/// Configuration parameters for the hybrid retriever and the reranker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Vector store collection holding the passages.
    pub collection: String,
    /// Candidates requested from each index and kept after fusion.
    pub hybrid_limit: usize,
    /// Documents kept after reranking.
    pub rerank_top_k: usize,
    /// The `k` in `1 / (k + rank)`.
    pub rank_constant: f32,
    /// Bound on each embedding call and each index query.
    pub search_timeout: Duration,
    /// Bound on the judging call.
    pub rerank_timeout: Duration,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            collection: DEFAULT_COLLECTION.to_string(),
            hybrid_limit: 40,
            rerank_top_k: 5,
            rank_constant: 60.0,
            search_timeout: Duration::from_secs(15),
            rerank_timeout: Duration::from_secs(60),
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    pub fn collection(mut self, name: impl Into<String>) -> Self {
        self.config.collection = name.into();
        self
    }

    pub fn hybrid_limit(mut self, limit: usize) -> Self {
        self.config.hybrid_limit = limit;
        self
    }

    pub fn rerank_top_k(mut self, k: usize) -> Self {
        self.config.rerank_top_k = k;
        self
    }

    pub fn rank_constant(mut self, k: f32) -> Self {
        self.config.rank_constant = k;
        self
    }

    pub fn search_timeout(mut self, timeout: Duration) -> Self {
        self.config.search_timeout = timeout;
        self
    }

    pub fn rerank_timeout(mut self, timeout: Duration) -> Self {
        self.config.rerank_timeout = timeout;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if:
    /// - `collection` is empty
    /// - `hybrid_limit == 0` or `rerank_top_k == 0`
    /// - `rank_constant` is not a positive finite number
    pub fn build(self) -> Result<RagConfig> {
        let config = self.config;
        if config.collection.trim().is_empty() {
            return Err(RagError::ConfigError("collection must not be empty".to_string()));
        }
        if config.hybrid_limit == 0 {
            return Err(RagError::ConfigError("hybrid_limit must be greater than zero".to_string()));
        }
        if config.rerank_top_k == 0 {
            return Err(RagError::ConfigError("rerank_top_k must be greater than zero".to_string()));
        }
        if !(config.rank_constant.is_finite() && config.rank_constant > 0.0) {
            return Err(RagError::ConfigError(format!(
                "rank_constant ({}) must be a positive number",
                config.rank_constant
            )));
        }
        Ok(config)
    }
}
