pub mod recommend;
pub mod trainer;

use serde::{Deserialize, Serialize};

use crate::{
    bm25::Bm25Stats,
    cooccurrence::{combine::MatrixCombiner, neighbours::FormatNeighbourhood},
    format::{index::FormatIndex, PerScheme, Scheme},
    utils::sparse::CscMatrix,
};

/// Trained statistics of one identifier scheme
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemeModel {
    pub index: FormatIndex,
    /// raw object-level co-occurrence counts
    pub object_counts: CscMatrix<u32>,
    /// raw directory-level co-occurrence counts
    pub directory_counts: CscMatrix<u32>,
    /// relative weights of `object_counts`
    pub object_weights: CscMatrix<f64>,
    /// relative weights of `directory_counts`
    pub directory_weights: CscMatrix<f64>,
    pub bm25: Bm25Stats,
}

impl SchemeModel {
    /// number of training objects of this scheme
    #[inline]
    pub fn object_count(&self) -> u64 {
        self.bm25.document_count
    }

    /// `g * W_object + gdir * W_directory`
    #[inline]
    pub fn global_matrix(&self, combiner: &MatrixCombiner) -> CscMatrix<f64> {
        combiner.global_matrix(&self.object_weights, &self.directory_weights)
    }

    /// Co-occurrence neighbourhood of one format identifier
    pub fn neighbourhood(&self, identifier: &str, combiner: &MatrixCombiner) -> Option<FormatNeighbourhood> {
        let id = self.index.get(identifier)?;
        let combined = self.global_matrix(combiner);
        Some(FormatNeighbourhood::of(
            &self.index,
            id,
            &self.object_weights,
            &self.directory_weights,
            &combined,
        ))
    }

    /// Neighbourhoods of every known format, in id order
    ///
    /// Formats that never co-occur with another format are left out.
    pub fn neighbourhoods(&self, combiner: &MatrixCombiner) -> Vec<FormatNeighbourhood> {
        let combined = self.global_matrix(combiner);
        self.index
            .iter()
            .map(|(_, id)| {
                FormatNeighbourhood::of(&self.index, id, &self.object_weights, &self.directory_weights, &combined)
            })
            .filter(|hood| {
                if hood.is_isolated() {
                    log::debug!("format {} does not co-occur with other known formats", hood.format);
                }
                !hood.is_isolated()
            })
            .collect()
    }
}

/// Immutable result of a training run, one [`SchemeModel`] per scheme
///
/// Shared read-only (usually behind an `Arc`) by every query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorpusModel {
    pub schemes: PerScheme<SchemeModel>,
}

impl CorpusModel {
    #[inline]
    pub fn scheme(&self, scheme: Scheme) -> &SchemeModel {
        &self.schemes[scheme]
    }

    /// Total number of training objects
    pub fn object_count(&self) -> u64 {
        self.schemes.iter().map(|(_, m)| m.object_count()).sum()
    }
}
