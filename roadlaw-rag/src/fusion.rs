//! Reciprocal Rank Fusion.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::document::{Document, SearchHit};

/// Fuse ranked hit lists into one ranking.
///
/// Each document scores `Σ 1 / (rank_constant + rank)` over the lists it
/// appears in, with `rank` starting at 1. A document repeated inside one list
/// counts once, at its best rank. The result is sorted by fused score
/// descending and truncated to `limit`; ties keep first-appearance order
/// (earlier lists first, then position within the list). The fused score is
/// returned as `hybrid_score`.
pub fn reciprocal_rank_fusion(
    lists: &[Vec<SearchHit>],
    rank_constant: f32,
    limit: usize,
) -> Vec<Document> {
    let mut fused: Vec<Document> = Vec::new();
    let mut position: HashMap<&str, usize> = HashMap::new();

    for list in lists {
        let mut seen_in_list: HashSet<&str> = HashSet::new();
        for (index, hit) in list.iter().enumerate() {
            if !seen_in_list.insert(hit.id.as_str()) {
                continue;
            }
            let contribution = 1.0 / (rank_constant + (index + 1) as f32);
            match position.get(hit.id.as_str()) {
                Some(&slot) => fused[slot].hybrid_score += contribution,
                None => {
                    position.insert(hit.id.as_str(), fused.len());
                    fused.push(Document {
                        id: hit.id.clone(),
                        payload: hit.payload.clone(),
                        hybrid_score: contribution,
                    });
                }
            }
        }
    }

    fused.sort_by(|a, b| b.hybrid_score.partial_cmp(&a.hybrid_score).unwrap_or(Ordering::Equal));
    fused.truncate(limit);
    fused
}
