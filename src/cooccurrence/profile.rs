use std::collections::BTreeSet;

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

use crate::{
    cooccurrence::CoOccurrenceMatrix,
    error::Result,
    format::{index::FormatIndex, report::DataObject, FormatId, Scheme},
    utils::sparse::CscMatrix,
};

/// Format statistics of one data object
///
/// Collected in a single pass over the files. Candidate matches are all
/// counted as if they were definite; `UNKNOWN` matches are only tallied.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectProfile {
    pub name: String,
    pub scheme: Scheme,
    /// files of the object, including unknown-only files
    pub file_count: usize,
    /// number of `UNKNOWN` match entries
    pub unknown_count: usize,
    /// format set per containing directory
    pub directories: IndexMap<String, BTreeSet<FormatId>>,
    /// union of all directory sets
    pub formats: BTreeSet<FormatId>,
    /// number of matches per format
    pub term_frequency: IndexMap<FormatId, u32>,
    /// distinct (id, human-readable label) pairs in first-seen order
    pub labels: IndexSet<(FormatId, String)>,
}

/// One distinct format of an object as it appears in a report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PresentFormat {
    pub id: String,
    pub label: String,
}

impl ObjectProfile {
    /// Collect the profile, assigning ids for unseen identifiers
    pub fn build(object: &DataObject, index: &mut FormatIndex) -> Self {
        let mut profile = Self {
            name: object.name.clone(),
            scheme: object.scheme,
            file_count: object.file_count(),
            unknown_count: 0,
            directories: IndexMap::new(),
            formats: BTreeSet::new(),
            term_frequency: IndexMap::new(),
            labels: IndexSet::new(),
        };
        for file in &object.files {
            let directory = file.directory();
            for candidate in &file.matches {
                if candidate.is_unknown() {
                    profile.unknown_count += 1;
                    continue;
                }
                let id = index.ensure(&candidate.id);
                if let Some(set) = profile.directories.get_mut(directory.as_ref()) {
                    set.insert(id);
                } else {
                    profile.directories.insert(directory.to_string(), BTreeSet::from([id]));
                }
                profile.formats.insert(id);
                *profile.term_frequency.entry(id).or_insert(0) += 1;
                profile.labels.insert((id, candidate.label.clone()));
            }
        }
        log::debug!(
            "profiled `{}`: {} files, {} formats, {} unknown",
            profile.name,
            profile.file_count,
            profile.formats.len(),
            profile.unknown_count
        );
        profile
    }

    /// Add this object's pairs to an object matrix and a directory matrix
    pub fn accumulate_into(&self, object: &mut CoOccurrenceMatrix, directory: &mut CoOccurrenceMatrix) {
        for set in self.directories.values() {
            directory.add_context(set);
        }
        object.add_context(&self.formats);
    }

    /// Fresh (object, directory) count matrices of this object alone
    pub fn local_matrices(&self, dim: usize) -> Result<(CscMatrix<u32>, CscMatrix<u32>)> {
        let mut object = CoOccurrenceMatrix::new();
        let mut directory = CoOccurrenceMatrix::new();
        self.accumulate_into(&mut object, &mut directory);
        Ok((object.to_csc(dim)?, directory.to_csc(dim)?))
    }

    /// Diagonal presence matrix: 1 at `(f, f)` for every format of the object
    pub fn presence(&self, dim: usize) -> Result<CscMatrix<f64>> {
        CscMatrix::diagonal(dim, self.formats.iter().copied(), 1.0)
    }

    /// BM25 document length
    #[inline]
    pub fn document_length(&self) -> usize {
        self.file_count
    }

    /// Distinct formats with their identifiers resolved through `index`
    pub fn present_formats(&self, index: &FormatIndex) -> Vec<PresentFormat> {
        self.labels
            .iter()
            .map(|(id, label)| PresentFormat {
                id: index.reverse(*id).unwrap_or_default().to_string(),
                label: label.clone(),
            })
            .collect()
    }
}
