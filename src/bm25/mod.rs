use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::format::FormatId;

/// Okapi BM25 control parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25Params {
    /// term frequency saturation
    pub k: f64,
    /// document length normalization
    pub b: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k: 1.2, b: 0.75 }
    }
}

/// Okapi BM25 term score
///
/// `(tf * (k + 1)) / (k * (1 - b + b * dl / avdl) + tf) * idf`
#[inline]
pub fn bm25(tf: f64, idf: f64, dl: f64, avdl: f64, params: Bm25Params) -> f64 {
    let Bm25Params { k, b } = params;
    (tf * (k + 1.0)) / (k * (1.0 - b + b * (dl / avdl)) + tf) * idf
}

/// Corpus statistics for BM25
///
/// A document is one training data object, its length the number of files and
/// its terms the distinct formats it contains.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bm25Stats {
    /// number of training objects
    pub document_count: u64,
    /// sum of all document lengths
    pub total_length: u64,
    /// number of objects containing each format at least once
    pub document_frequency: IndexMap<FormatId, u64>,
}

impl Bm25Stats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one training object
    pub fn add_document(&mut self, length: usize, formats: &BTreeSet<FormatId>) {
        self.document_count += 1;
        self.total_length += length as u64;
        for &id in formats {
            *self.document_frequency.entry(id).or_insert(0) += 1;
        }
    }

    /// Mean document length, 0 for an empty corpus
    #[inline]
    pub fn avdl(&self) -> f64 {
        if self.document_count == 0 {
            return 0.0;
        }
        self.total_length as f64 / self.document_count as f64
    }

    /// `log2(N / df)`; 0 for a format that never occurred in training
    #[inline]
    pub fn idf(&self, id: FormatId) -> f64 {
        match self.document_frequency.get(&id) {
            Some(&df) if df > 0 => (self.document_count as f64 / df as f64).log2(),
            _ => 0.0,
        }
    }

    #[inline]
    pub fn document_frequency(&self, id: FormatId) -> u64 {
        self.document_frequency.get(&id).copied().unwrap_or(0)
    }

    /// Score of one environment against an object's format frequencies
    ///
    /// Sum over the readable formats that also occur in `tf`. Formats the
    /// object does not contain contribute nothing. A corpus without documents
    /// has no length statistics and scores 0.
    pub fn score<'a, I>(&self, tf: &IndexMap<FormatId, u32>, dl: usize, readable: I, params: Bm25Params) -> f64
    where
        I: IntoIterator<Item = &'a FormatId>,
    {
        let avdl = self.avdl();
        if avdl == 0.0 {
            return 0.0;
        }
        readable
            .into_iter()
            .filter_map(|id| tf.get(id).map(|f| (id, *f)))
            .map(|(id, f)| bm25(f as f64, self.idf(*id), dl as f64, avdl, params))
            .sum()
    }
}
