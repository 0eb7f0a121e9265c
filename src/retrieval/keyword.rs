//! Keyword retrieval
//!
//! Always-available fallback. Scores each catalog entry by token overlap:
//! +2 for every request token found inside the query name, +1 for every
//! token found inside the description (both lowercased, substring match).

use std::collections::HashSet;

use super::RetrievalHit;
use crate::catalog::Catalog;

const NAME_WEIGHT: u32 = 2;
const DESCRIPTION_WEIGHT: u32 = 1;

/// Rank catalog entries against `text`, returning at most `k` with score > 0
pub fn rank(catalog: &Catalog, text: &str, k: usize) -> Vec<RetrievalHit> {
    let lowered = text.to_lowercase();
    let tokens: HashSet<&str> = lowered.split_whitespace().collect();

    let mut scored: Vec<(u32, usize)> = catalog
        .queries()
        .iter()
        .enumerate()
        .filter_map(|(position, query)| {
            let name = query.name.to_lowercase();
            let description = query.description.to_lowercase();
            let score: u32 = tokens
                .iter()
                .map(|token| {
                    let mut s = 0;
                    if name.contains(token) {
                        s += NAME_WEIGHT;
                    }
                    if description.contains(token) {
                        s += DESCRIPTION_WEIGHT;
                    }
                    s
                })
                .sum();
            (score > 0).then_some((score, position))
        })
        .collect();

    // stable: equal scores keep catalog order
    scored.sort_by(|a, b| b.0.cmp(&a.0));

    scored
        .into_iter()
        .take(k)
        .map(|(score, position)| RetrievalHit {
            query: catalog.queries()[position].clone(),
            score: score as f32,
        })
        .collect()
}
