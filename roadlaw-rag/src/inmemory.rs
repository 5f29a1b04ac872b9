//! In-memory vector store with cosine (dense) and dot-product (sparse) search.
//!
//! [`InMemoryVectorStore`] keeps points in insertion order behind a
//! `tokio::sync::RwLock`. It backs tests and local fixtures; the serving path
//! only ever reads from it.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::document::{LawPayload, SearchHit, SparseVector};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

/// A fixture point: payload plus both vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredPoint {
    pub id: String,
    pub payload: LawPayload,
    pub dense: Vec<f32>,
    pub sparse: SparseVector,
}

/// An in-memory [`VectorStore`].
///
/// Hits with equal scores keep insertion order.
///
/// # Example
///
/// ```rust,ignore
/// use roadlaw_rag::{InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.insert("traffic_law_qa_system", points).await;
/// let hits = store.search_dense("traffic_law_qa_system", &query, 10).await?;
/// ```
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, Vec<StoredPoint>>>,
}

impl InMemoryVectorStore {
    /// Create a new empty in-memory vector store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load fixture points, creating the collection if needed. A point whose
    /// id already exists replaces it in place.
    pub async fn insert(&self, collection: &str, points: impl IntoIterator<Item = StoredPoint>) {
        let mut collections = self.collections.write().await;
        let stored = collections.entry(collection.to_string()).or_default();
        for point in points {
            match stored.iter_mut().find(|p| p.id == point.id) {
                Some(existing) => *existing = point,
                None => stored.push(point),
            }
        }
    }

    async fn ranked<F>(&self, collection: &str, limit: usize, score: F) -> Result<Vec<SearchHit>>
    where
        F: Fn(&StoredPoint) -> f32,
    {
        let collections = self.collections.read().await;
        let points = collections.get(collection).ok_or_else(|| RagError::VectorStoreError {
            backend: "InMemory".to_string(),
            message: format!("collection '{collection}' does not exist"),
        })?;

        let mut hits: Vec<SearchHit> = points
            .iter()
            .map(|p| SearchHit { id: p.id.clone(), payload: p.payload.clone(), score: score(p) })
            .collect();
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        hits.truncate(limit);
        Ok(hits)
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn search_dense(
        &self,
        collection: &str,
        embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<SearchHit>> {
        self.ranked(collection, limit, |p| cosine_similarity(&p.dense, embedding)).await
    }

    /// Points sharing no term with the query are not hits, matching how a
    /// sparse index behaves.
    async fn search_sparse(
        &self,
        collection: &str,
        vector: &SparseVector,
        limit: usize,
    ) -> Result<Vec<SearchHit>> {
        let mut hits = self.ranked(collection, usize::MAX, |p| p.sparse.dot(vector)).await?;
        hits.retain(|h| h.score > 0.0);
        hits.truncate(limit);
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(id: &str, dense: Vec<f32>, terms: &[u32]) -> StoredPoint {
        StoredPoint {
            id: id.to_string(),
            payload: LawPayload::new("2024", id, "title", "content"),
            dense,
            sparse: SparseVector { indices: terms.to_vec(), values: vec![1.0; terms.len()] },
        }
    }

    #[tokio::test]
    async fn missing_collection_is_a_store_error() {
        let store = InMemoryVectorStore::new();
        let err = store.search_dense("nope", &[1.0], 3).await.unwrap_err();
        assert!(err.is_retrieval_failure());
    }

    #[tokio::test]
    async fn sparse_search_skips_non_overlapping_points() {
        let store = InMemoryVectorStore::new();
        let points =
            [point("a", vec![1.0], &[1, 2]), point("b", vec![1.0], &[3]), point("c", vec![1.0], &[2])];
        store.insert("c", points).await;
        let query = SparseVector { indices: vec![2], values: vec![1.0] };
        let hits = store.search_sparse("c", &query, 10).await.unwrap();
        let ids: Vec<_> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn dense_ties_keep_insertion_order() {
        let store = InMemoryVectorStore::new();
        let points = [
            point("x", vec![1.0, 0.0], &[]),
            point("y", vec![2.0, 0.0], &[]),
            point("z", vec![0.0, 1.0], &[]),
        ];
        store.insert("c", points).await;
        let hits = store.search_dense("c", &[1.0, 0.0], 2).await.unwrap();
        let ids: Vec<_> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["x", "y"]);
    }
}
