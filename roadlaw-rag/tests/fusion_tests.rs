//! Property tests for reciprocal rank fusion.

use std::collections::HashSet;

use proptest::prelude::*;
use roadlaw_rag::document::{LawPayload, SearchHit};
use roadlaw_rag::fusion::reciprocal_rank_fusion;

/// A ranked list of hits drawn from a small id space so lists overlap.
fn arb_ranking() -> impl Strategy<Value = Vec<SearchHit>> {
    proptest::collection::vec(0u8..30, 0..25).prop_map(|ids| {
        ids.into_iter()
            .map(|id| SearchHit {
                id: format!("p{id}"),
                payload: LawPayload::new("2024", id.to_string(), "title", "content"),
                score: 1.0,
            })
            .collect()
    })
}

/// *For any* dense and sparse rankings, fusing them twice yields the same
/// order and scores, at most `limit` unique documents, in non-increasing
/// score order.
mod prop_fusion {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn fusion_is_deterministic_bounded_and_sorted(
            dense in arb_ranking(),
            sparse in arb_ranking(),
            limit in 1usize..50,
        ) {
            let lists = [dense, sparse];
            let first = reciprocal_rank_fusion(&lists, 60.0, limit);
            let second = reciprocal_rank_fusion(&lists, 60.0, limit);
            prop_assert_eq!(&first, &second);

            prop_assert!(first.len() <= limit);
            let unique: HashSet<&str> = first.iter().map(|d| d.id.as_str()).collect();
            prop_assert_eq!(unique.len(), first.len());

            for window in first.windows(2) {
                prop_assert!(
                    window[0].hybrid_score >= window[1].hybrid_score,
                    "fused scores not descending: {} < {}",
                    window[0].hybrid_score,
                    window[1].hybrid_score,
                );
            }
        }

        #[test]
        fn fused_set_is_the_union_when_limit_allows(
            dense in arb_ranking(),
            sparse in arb_ranking(),
        ) {
            let expected: HashSet<String> =
                dense.iter().chain(sparse.iter()).map(|h| h.id.clone()).collect();
            let fused = reciprocal_rank_fusion(&[dense, sparse], 60.0, 100);
            let got: HashSet<String> = fused.into_iter().map(|d| d.id).collect();
            prop_assert_eq!(got, expected);
        }
    }
}
