pub mod combine;
pub mod neighbours;
pub mod normalize;
pub mod profile;

use std::collections::{BTreeSet, HashMap};

use ahash::RandomState;

use crate::{error::Result, format::FormatId, utils::sparse::CscMatrix};

/// Symmetric co-occurrence counts keyed by `(row, col)`
///
/// Both orientations of a pair are always stored with the same value and the
/// diagonal is never touched, so the matrix is symmetric with a zero diagonal
/// by construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoOccurrenceMatrix {
    counts: HashMap<(FormatId, FormatId), u32, RandomState>,
}

impl CoOccurrenceMatrix {
    pub fn new() -> Self {
        Self {
            counts: HashMap::with_hasher(RandomState::new()),
        }
    }

    /// Count one co-occurrence of `a` and `b`; self pairs are ignored
    #[inline]
    pub fn add_pair(&mut self, a: FormatId, b: FormatId) {
        if a == b {
            return;
        }
        let (a, b) = if a < b { (a, b) } else { (b, a) };
        *self.counts.entry((a, b)).or_insert(0) += 1;
        *self.counts.entry((b, a)).or_insert(0) += 1;
    }

    /// Count every 2-combination of the distinct formats of one context
    ///
    /// A context with at most one format contributes nothing.
    pub fn add_context(&mut self, formats: &BTreeSet<FormatId>) {
        let ids: Vec<FormatId> = formats.iter().copied().collect();
        for (pos, &a) in ids.iter().enumerate() {
            for &b in &ids[pos + 1..] {
                self.add_pair(a, b);
            }
        }
    }

    #[inline]
    pub fn get(&self, row: FormatId, col: FormatId) -> u32 {
        self.counts.get(&(row, col)).copied().unwrap_or(0)
    }

    /// number of stored coordinates (both orientations counted)
    #[inline]
    pub fn nnz(&self) -> usize {
        self.counts.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FormatId, FormatId, u32)> + '_ {
        self.counts.iter().map(|(&(r, c), &v)| (r, c, v))
    }

    /// Freeze into a `dim x dim` sparse matrix
    pub fn to_csc(&self, dim: usize) -> Result<CscMatrix<u32>> {
        CscMatrix::from_triplets(dim, self.iter())
    }

    /// Reopen a frozen matrix for further counting
    pub fn from_csc(matrix: &CscMatrix<u32>) -> Self {
        let mut counts = HashMap::with_capacity_and_hasher(matrix.nnz(), RandomState::new());
        counts.extend(matrix.raw_iter().map(|(r, c, v)| ((r, c), v)));
        Self { counts }
    }
}
