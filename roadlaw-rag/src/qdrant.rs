//! Qdrant vector store backend.
//!
//! Provides [`QdrantVectorStore`] which implements [`VectorStore`] using
//! the [qdrant-client](https://docs.rs/qdrant-client) crate over gRPC. The
//! collection carries two named vectors, `dense` and `sparse`, and one
//! [`LawPayload`] per point.
//!
//! # Example
//!
//! ```rust,ignore
//! use roadlaw_rag::qdrant::QdrantVectorStore;
//!
//! let store = QdrantVectorStore::new("http://localhost:6334", std::env::var("QDRANT_API_KEY").ok())?;
//! let hits = store.search_dense("traffic_law_qa_system", &embedding, 40).await?;
//! ```

use std::collections::HashMap;

use async_trait::async_trait;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::point_id::PointIdOptions;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{
    PointId, Query, QueryPointsBuilder, ScoredPoint, Value as QdrantValue, VectorInput,
};
use tracing::{debug, instrument};

use crate::document::{LawPayload, SearchHit, SparseVector};
use crate::error::{RagError, Result};
use crate::vectorstore::{DENSE_VECTOR_NAME, SPARSE_VECTOR_NAME, VectorStore};

/// A read-only [`VectorStore`] backed by [Qdrant](https://qdrant.tech/).
pub struct QdrantVectorStore {
    client: Qdrant,
}

impl QdrantVectorStore {
    /// Connect to the given URL, authenticating with `api_key` when present.
    pub fn new(url: &str, api_key: Option<String>) -> Result<Self> {
        let mut builder = Qdrant::from_url(url);
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            builder = builder.api_key(key);
        }
        let client = builder.build().map_err(Self::map_err)?;
        Ok(Self { client })
    }

    fn map_err(e: qdrant_client::QdrantError) -> RagError {
        RagError::VectorStoreError { backend: "qdrant".to_string(), message: e.to_string() }
    }

    async fn query(
        &self,
        collection: &str,
        query: Query,
        using: &str,
        limit: usize,
    ) -> Result<Vec<SearchHit>> {
        let request = QueryPointsBuilder::new(collection)
            .query(query)
            .using(using)
            .limit(limit as u64)
            .with_payload(true);
        let response = self.client.query(request).await.map_err(Self::map_err)?;
        debug!(collection, using, hits = response.result.len(), "qdrant query finished");
        Ok(response.result.into_iter().map(to_hit).collect())
    }
}

fn point_id_string(id: Option<&PointId>) -> String {
    id.and_then(|pid| match &pid.point_id_options {
        Some(PointIdOptions::Uuid(s)) => Some(s.clone()),
        Some(PointIdOptions::Num(n)) => Some(n.to_string()),
        None => None,
    })
    .unwrap_or_default()
}

/// Payload value as text; integers and whole doubles lose their decimal part.
fn value_string(value: &QdrantValue) -> Option<String> {
    match &value.kind {
        Some(Kind::StringValue(s)) => Some(s.clone()),
        Some(Kind::IntegerValue(n)) => Some(n.to_string()),
        Some(Kind::DoubleValue(f)) if f.fract() == 0.0 => Some(format!("{f:.0}")),
        Some(Kind::DoubleValue(f)) => Some(f.to_string()),
        _ => None,
    }
}

fn payload_field(payload: &HashMap<String, QdrantValue>, key: &str) -> String {
    payload.get(key).and_then(value_string).unwrap_or_default()
}

fn to_hit(point: ScoredPoint) -> SearchHit {
    let payload = LawPayload {
        year: payload_field(&point.payload, "year"),
        article: payload_field(&point.payload, "article"),
        title: payload_field(&point.payload, "title"),
        content: payload_field(&point.payload, "content"),
    };
    SearchHit { id: point_id_string(point.id.as_ref()), payload, score: point.score }
}

#[async_trait]
impl VectorStore for QdrantVectorStore {
    #[instrument(skip_all, fields(collection = %collection, limit = limit))]
    async fn search_dense(
        &self,
        collection: &str,
        embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<SearchHit>> {
        self.query(collection, Query::new_nearest(embedding.to_vec()), DENSE_VECTOR_NAME, limit)
            .await
    }

    #[instrument(skip_all, fields(collection = %collection, limit = limit, terms = vector.indices.len()))]
    async fn search_sparse(
        &self,
        collection: &str,
        vector: &SparseVector,
        limit: usize,
    ) -> Result<Vec<SearchHit>> {
        if vector.is_empty() {
            return Ok(Vec::new());
        }
        let input = VectorInput::new_sparse(vector.indices.clone(), vector.values.clone());
        self.query(collection, Query::new_nearest(input), SPARSE_VECTOR_NAME, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_payload_values_become_strings() {
        let year = QdrantValue { kind: Some(Kind::IntegerValue(2024)) };
        let article = QdrantValue { kind: Some(Kind::DoubleValue(6.0)) };
        assert_eq!(value_string(&year).as_deref(), Some("2024"));
        assert_eq!(value_string(&article).as_deref(), Some("6"));
    }

    #[test]
    fn point_ids_render_as_strings() {
        let id = PointId { point_id_options: Some(PointIdOptions::Num(42)) };
        assert_eq!(point_id_string(Some(&id)), "42");
        assert_eq!(point_id_string(None), "");
    }
}
