pub mod ranking;

use indexmap::IndexMap;
use serde::Serialize;

use crate::{
    bm25::{Bm25Params, Bm25Stats},
    environment::ResolvedEnvironment,
    format::FormatId,
    matcher::ranking::Ranking,
    utils::sparse::CscMatrix,
};

/// Co-occurrence score of every environment
///
/// Sum of all affinity entries whose row and column are both readable by the
/// environment. Symmetric entries are counted twice, the diagonal once.
pub fn rank_by_cooccurrence(affinity: &CscMatrix<f64>, environments: &[ResolvedEnvironment]) -> Ranking {
    Ranking::new(
        environments
            .iter()
            .map(|env| {
                let score: f64 = affinity
                    .raw_iter()
                    .filter(|(r, c, _)| env.readable.contains(r) && env.readable.contains(c))
                    .map(|(_, _, v)| v)
                    .sum();
                (env.name.clone(), score)
            })
            .collect(),
    )
}

/// BM25 score of every environment for one object's format frequencies
pub fn rank_by_bm25(
    stats: &Bm25Stats,
    tf: &IndexMap<FormatId, u32>,
    dl: usize,
    environments: &[ResolvedEnvironment],
    params: Bm25Params,
) -> Ranking {
    Ranking::new(
        environments
            .iter()
            .map(|env| (env.name.clone(), stats.score(tf, dl, &env.readable, params)))
            .collect(),
    )
}

/// Whether each environment reads every format present in the object
///
/// `presence` is the diagonal presence matrix; the scan stops at the first
/// format the environment cannot read.
pub fn all_formats_known(presence: &CscMatrix<f64>, environments: &[ResolvedEnvironment]) -> IndexMap<String, bool> {
    environments
        .iter()
        .map(|env| {
            let known = presence.diagonal_ids().all(|id| env.readable.contains(&id));
            (env.name.clone(), known)
        })
        .collect()
}

/// Normalized scores of one environment
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MergedScore {
    pub co_occurrence: f64,
    pub bm25: f64,
    /// mean of the two normalized scores
    pub combined: f64,
}

/// Normalize both rankings and join them by environment
///
/// `None` when both rankings total zero: nothing can be ranked.
pub fn merge_rankings(co_occurrence: &Ranking, bm25: &Ranking) -> Option<IndexMap<String, MergedScore>> {
    if co_occurrence.total() == 0.0 && bm25.total() == 0.0 {
        return None;
    }
    let co_occurrence = co_occurrence.normalized();
    let bm25 = bm25.normalized();
    let mut merged: IndexMap<String, MergedScore> = IndexMap::with_capacity(co_occurrence.len());
    for (name, score) in &co_occurrence.list {
        merged.insert(name.clone(), MergedScore { co_occurrence: *score, bm25: 0.0, combined: 0.0 });
    }
    for (name, score) in &bm25.list {
        merged
            .entry(name.clone())
            .or_insert(MergedScore { co_occurrence: 0.0, bm25: 0.0, combined: 0.0 })
            .bm25 = *score;
    }
    for entry in merged.values_mut() {
        entry.combined = (entry.co_occurrence + entry.bm25) / 2.0;
    }
    Some(merged)
}
