//! Data types for legal passages, search hits and scored documents.

use serde::{Deserialize, Deserializer, Serialize};

/// The payload stored with every point: one article (or clause) of a decree.
///
/// `year` and `article` are written as numbers by some ingestion runs and as
/// strings by others; both forms deserialize to strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LawPayload {
    #[serde(default, deserialize_with = "lenient_string")]
    pub year: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub article: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

impl LawPayload {
    pub fn new(
        year: impl Into<String>,
        article: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            year: year.into(),
            article: article.into(),
            title: title.into(),
            content: content.into(),
        }
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Lenient {
        Text(String),
        Integer(i64),
        Float(f64),
        Missing(()),
    }

    Ok(match Lenient::deserialize(deserializer)? {
        Lenient::Text(s) => s,
        Lenient::Integer(n) => n.to_string(),
        Lenient::Float(f) if f.fract() == 0.0 => format!("{f:.0}"),
        Lenient::Float(f) => f.to_string(),
        Lenient::Missing(()) => String::new(),
    })
}

/// One hit from a single index query, in the store's native order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchHit {
    pub id: String,
    pub payload: LawPayload,
    /// The store's similarity score for this index.
    pub score: f32,
}

/// A retrieved passage. Immutable once produced by the retriever.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Point id; unique within one retrieval call.
    pub id: String,
    pub payload: LawPayload,
    /// Fused reciprocal-rank score.
    pub hybrid_score: f32,
}

/// A [`Document`] copied together with its relevance score in `[0, 10]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredDocument {
    #[serde(flatten)]
    pub document: Document,
    pub rerank_score: f32,
}

/// A sparse vector in index/value form, as stored in the `sparse` named vector.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SparseVector {
    pub indices: Vec<u32>,
    pub values: Vec<f32>,
}

impl SparseVector {
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Dot product over the indices both vectors share.
    pub fn dot(&self, other: &SparseVector) -> f32 {
        self.indices
            .iter()
            .zip(&self.values)
            .filter_map(|(index, value)| {
                other.indices.iter().position(|i| i == index).map(|pos| value * other.values[pos])
            })
            .sum()
    }
}
