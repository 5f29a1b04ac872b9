//! Local BM25 query embedding.
//!
//! Passages are indexed by fastembed's `Qdrant/bm25` model: lowercased word
//! tokens, English stopwords removed, Snowball English stems, each stem keyed
//! by the absolute signed murmur3 hash. A query only needs the same term ids
//! with unit weight, so it is embedded in-process without a model round trip.

use std::collections::BTreeSet;
use std::fmt;
use std::io::Cursor;
use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};

use crate::document::SparseVector;
use crate::embedding::SparseEmbeddingProvider;
use crate::error::{RagError, Result};

/// Tokens longer than this are dropped.
const MAX_TOKEN_LENGTH: usize = 40;

/// fastembed's English stopword list (the NLTK set).
const STOPWORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself",
    "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself", "they", "them",
    "their", "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "that'll",
    "these", "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or",
    "because", "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below", "to", "from",
    "up", "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "s", "t", "can", "will", "just", "don", "don't", "should", "should've", "now",
    "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn",
    "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn",
    "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan", "shan't",
    "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't", "wouldn",
    "wouldn't",
];

/// [`SparseEmbeddingProvider`] that reproduces the term ids of a
/// `Qdrant/bm25` index for query text.
#[derive(Clone)]
pub struct Bm25SparseEmbedder {
    punctuation: Regex,
    stemmer: Arc<Stemmer>,
}

impl fmt::Debug for Bm25SparseEmbedder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bm25SparseEmbedder").field("stemmer", &"english").finish()
    }
}

impl Bm25SparseEmbedder {
    pub fn new() -> Result<Self> {
        let punctuation = Regex::new(r"[^\w\s]+")
            .map_err(|e| RagError::ConfigError(format!("invalid tokenizer pattern: {e}")))?;
        Ok(Self { punctuation, stemmer: Arc::new(Stemmer::create(Algorithm::English)) })
    }

    /// Lowercased word tokens with punctuation removed.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        self.punctuation.replace_all(&lowered, " ").split_whitespace().map(str::to_string).collect()
    }

    /// Indexed terms of `text`: tokens minus stopwords and over-long tokens,
    /// stemmed.
    pub fn terms(&self, text: &str) -> Vec<String> {
        self.tokenize(text)
            .into_iter()
            .filter(|token| !STOPWORDS.contains(&token.as_str()))
            .filter(|token| token.chars().count() <= MAX_TOKEN_LENGTH)
            .map(|token| self.stemmer.stem(&token).into_owned())
            .filter(|stem| !stem.is_empty())
            .collect()
    }

    /// Term ids of `text`, each with weight 1.0, sorted by id.
    pub fn embed_query(&self, text: &str) -> Result<SparseVector> {
        let indices = self
            .terms(text)
            .iter()
            .map(|term| term_id(term))
            .collect::<Result<BTreeSet<u32>>>()?;
        let values = vec![1.0; indices.len()];
        Ok(SparseVector { indices: indices.into_iter().collect(), values })
    }
}

#[async_trait]
impl SparseEmbeddingProvider for Bm25SparseEmbedder {
    async fn embed_sparse(&self, text: &str) -> Result<SparseVector> {
        self.embed_query(text)
    }
}

/// Absolute value of the signed 32-bit murmur3 hash (seed 0) of `term`.
pub fn term_id(term: &str) -> Result<u32> {
    let hash = murmur3::murmur3_32(&mut Cursor::new(term.as_bytes()), 0).map_err(|e| {
        RagError::EmbeddingError { provider: "bm25".into(), message: format!("hashing '{term}': {e}") }
    })?;
    Ok((hash as i32).unsigned_abs())
}
