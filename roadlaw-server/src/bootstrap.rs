//! Construct the shared components from configuration.

use std::sync::Arc;

use anyhow::Context;
use roadlaw_agent::Components;
use roadlaw_model::{OpenAIClient, OpenAIConfig};
use roadlaw_rag::{
    Bm25SparseEmbedder, HybridRetriever, LlmReranker, OpenAIEmbeddingProvider, QdrantVectorStore,
};
use tracing::info;

use crate::config::ServerConfig;

/// Task hint sent to Jina embedding models for search queries.
const QUERY_TASK: &str = "retrieval.query";

fn chat_client(config: &ServerConfig, model: &str, timeout: std::time::Duration) -> anyhow::Result<OpenAIClient> {
    let mut settings = OpenAIConfig::new(&config.chat.api_key, model)
        .with_request_timeout(timeout)
        .with_stream_idle_timeout(config.pipeline.stream_idle_timeout);
    if let Some(base_url) = &config.chat.base_url {
        settings = settings.with_base_url(base_url);
    }
    OpenAIClient::new(settings).with_context(|| format!("failed to create chat client for {model}"))
}

/// Build the model clients, the retriever and the reranker once at startup.
pub fn build_components(config: &ServerConfig) -> anyhow::Result<Components> {
    let llm = chat_client(config, &config.chat.model, config.pipeline.llm_timeout)?;
    let judge = chat_client(config, &config.chat.reranker_model, config.rag.rerank_timeout)?;

    let mut dense = OpenAIEmbeddingProvider::new(&config.embedding.api_key)
        .context("failed to create embedding provider")?
        .with_base_url(&config.embedding.base_url)
        .with_model(&config.embedding.model)
        .with_dimensions(config.embedding.dimensions)
        .with_timeout(config.rag.search_timeout);
    if config.embedding.model.contains("jina") {
        dense = dense.with_task(QUERY_TASK);
    }

    let sparse = Bm25SparseEmbedder::new().context("failed to create BM25 embedder")?;
    let store = QdrantVectorStore::new(&config.qdrant.url, config.qdrant.api_key.clone())
        .with_context(|| format!("failed to create Qdrant client for {}", config.qdrant.url))?;

    let retriever =
        HybridRetriever::new(Arc::new(dense), Arc::new(sparse), Arc::new(store), config.rag.clone());
    let reranker = LlmReranker::new(Arc::new(judge)).with_timeout(config.rag.rerank_timeout);

    info!(
        mode = %config.pipeline.mode,
        chat_model = %config.chat.model,
        reranker_model = %config.chat.reranker_model,
        dense_model = %config.embedding.model,
        collection = %config.rag.collection,
        "components ready"
    );

    Ok(Components { llm: Arc::new(llm), retriever: Arc::new(retriever), reranker: Arc::new(reranker) })
}
