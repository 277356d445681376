use std::path::Path;

use crate::{
    bm25::Bm25Stats,
    cooccurrence::{normalize::relative_weight_matrix, profile::ObjectProfile, CoOccurrenceMatrix},
    error::Result,
    format::{
        index::FormatIndex,
        report::{read_report_dir, DataObject},
        PerScheme, Scheme,
    },
    model::{CorpusModel, SchemeModel},
};

/// Mutable training state of one scheme
#[derive(Debug, Clone, Default)]
struct SchemeTrainer {
    index: FormatIndex,
    object: CoOccurrenceMatrix,
    directory: CoOccurrenceMatrix,
    bm25: Bm25Stats,
}

impl SchemeTrainer {
    fn add(&mut self, object: &DataObject) -> ObjectProfile {
        let profile = ObjectProfile::build(object, &mut self.index);
        profile.accumulate_into(&mut self.object, &mut self.directory);
        self.bm25.add_document(profile.document_length(), &profile.formats);
        profile
    }

    fn finish(self) -> Result<SchemeModel> {
        let dim = self.index.dim();
        let object_counts = self.object.to_csc(dim)?;
        let directory_counts = self.directory.to_csc(dim)?;
        let object_weights = relative_weight_matrix(&object_counts);
        let directory_weights = relative_weight_matrix(&directory_counts);
        Ok(SchemeModel {
            index: self.index,
            object_counts,
            directory_counts,
            object_weights,
            directory_weights,
            bm25: self.bm25,
        })
    }
}

/// Outcome of a batch training run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrainingSummary {
    pub added: usize,
    pub skipped: usize,
}

/// Accumulates the corpus-wide statistics of a training corpus
///
/// Global matrices are never reset; every object adds to them. Call
/// [`CorpusTrainer::finish`] to freeze the result into a [`CorpusModel`].
#[derive(Debug, Clone, Default)]
pub struct CorpusTrainer {
    schemes: PerScheme<SchemeTrainer>,
}

impl CorpusTrainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue training on top of a persisted model
    pub fn resume(model: &CorpusModel) -> Self {
        Self {
            schemes: model.schemes.as_ref().map(|_, m| SchemeTrainer {
                index: m.index.clone(),
                object: CoOccurrenceMatrix::from_csc(&m.object_counts),
                directory: CoOccurrenceMatrix::from_csc(&m.directory_counts),
                bm25: m.bm25.clone(),
            }),
        }
    }

    /// Add one validated data object to the statistics of its scheme
    pub fn add_object(&mut self, object: &DataObject) -> ObjectProfile {
        let profile = self.schemes[object.scheme].add(object);
        log::debug!("trained on `{}` ({})", object.name, object.scheme);
        profile
    }

    /// Train on every report of a directory
    ///
    /// Malformed reports are logged and skipped; nothing of a skipped object is
    /// counted.
    pub fn train_dir(&mut self, dir: impl AsRef<Path>) -> Result<TrainingSummary> {
        let mut summary = TrainingSummary::default();
        for (name, parsed) in read_report_dir(dir)? {
            match parsed {
                Ok(object) => {
                    self.add_object(&object);
                    summary.added += 1;
                }
                Err(e) => {
                    log::warn!("skipping data object {}: {}", name, e);
                    summary.skipped += 1;
                }
            }
        }
        log::info!("training: {} objects added, {} skipped", summary.added, summary.skipped);
        Ok(summary)
    }

    #[inline]
    pub fn object_count(&self, scheme: Scheme) -> u64 {
        self.schemes[scheme].bm25.document_count
    }

    #[inline]
    pub fn index(&self, scheme: Scheme) -> &FormatIndex {
        &self.schemes[scheme].index
    }

    /// Freeze raw counts and compute the normalized global matrices
    pub fn finish(self) -> Result<CorpusModel> {
        let PerScheme { wikidata, pronom } = self.schemes;
        let model = CorpusModel {
            schemes: PerScheme::new(wikidata.finish()?, pronom.finish()?),
        };
        for (scheme, m) in model.schemes.iter() {
            log::info!(
                "{}: {} objects, {} formats, {} object pairs, {} directory pairs",
                scheme,
                m.object_count(),
                m.index.len(),
                m.object_counts.nnz() / 2,
                m.directory_counts.nnz() / 2
            );
        }
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::ScoringConfig, cooccurrence::combine::MatrixCombiner};

    fn corpus() -> Vec<DataObject> {
        vec![
            DataObject::new("one", Scheme::Pronom)
                .with_file("a.doc", &["fmt/40"])
                .with_file("b.xls", &["fmt/61"]),
            DataObject::new("two", Scheme::Pronom)
                .with_file("d/a.doc", &["fmt/40"])
                .with_file("e/c.pdf", &["fmt/18"])
                .with_file("e/d.pdf", &["fmt/18"])
                .with_file("e/x.bin", &["UNKNOWN"]),
            DataObject::new("three", Scheme::Wikidata).with_file("a", &["Q1", "Q2"]),
        ]
    }

    #[test]
    fn schemes_are_trained_separately() {
        let mut trainer = CorpusTrainer::new();
        for object in corpus() {
            trainer.add_object(&object);
        }
        assert_eq!(trainer.object_count(Scheme::Pronom), 2);
        assert_eq!(trainer.object_count(Scheme::Wikidata), 1);
        let model = trainer.finish().unwrap();
        let pronom = model.scheme(Scheme::Pronom);
        assert_eq!(pronom.index.len(), 3);
        assert_eq!(model.scheme(Scheme::Wikidata).index.len(), 2);
        assert_eq!(model.object_count(), 3);

        let (doc, xls, pdf) = (
            pronom.index.get("fmt/40").unwrap(),
            pronom.index.get("fmt/61").unwrap(),
            pronom.index.get("fmt/18").unwrap(),
        );
        assert_eq!(pronom.object_counts.get(doc, xls), Some(1));
        assert_eq!(pronom.object_counts.get(doc, pdf), Some(1));
        // a.doc and b.xls share the root directory, d/ and e/ are apart
        assert_eq!(pronom.directory_counts.get(doc, xls), Some(1));
        assert_eq!(pronom.directory_counts.get(doc, pdf), None);
        assert!(pronom.object_weights.is_symmetric());
        assert_eq!(pronom.bm25.avdl(), 3.0);
        assert_eq!(pronom.bm25.idf(pdf), 1.0);
    }

    #[test]
    fn resume_keeps_counting() {
        let mut trainer = CorpusTrainer::new();
        let objects = corpus();
        trainer.add_object(&objects[0]);
        let model = trainer.finish().unwrap();

        let mut resumed = CorpusTrainer::resume(&model);
        resumed.add_object(&objects[1]);
        let model = resumed.finish().unwrap();
        let pronom = model.scheme(Scheme::Pronom);
        assert_eq!(pronom.index.get("fmt/18"), Some(2));
        assert_eq!(pronom.object_count(), 2);
        assert_eq!(pronom.object_counts.get(0, 1), Some(1));
    }

    #[test]
    fn neighbourhoods_skip_isolated_formats() {
        let mut trainer = CorpusTrainer::new();
        for object in corpus() {
            trainer.add_object(&object);
        }
        trainer.add_object(&DataObject::new("solo", Scheme::Pronom).with_file("z", &["fmt/999"]));
        let model = trainer.finish().unwrap();
        let combiner = MatrixCombiner::new(&ScoringConfig::default());
        let pronom = model.scheme(Scheme::Pronom);
        let hoods = pronom.neighbourhoods(&combiner);
        assert_eq!(hoods.len(), 3);
        let doc = pronom.neighbourhood("fmt/40", &combiner).unwrap();
        assert_eq!(doc.neighbours.len(), 2);
        let total: f64 = doc.neighbours.iter().map(|n| n.object).sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert!(pronom.neighbourhood("fmt/999", &combiner).unwrap().is_isolated());
        assert!(pronom.neighbourhood("nope", &combiner).is_none());
    }
}
