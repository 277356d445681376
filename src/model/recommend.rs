use std::{path::Path, sync::Arc};

use serde::Serialize;

use crate::{
    bm25::Bm25Params,
    config::ScoringConfig,
    cooccurrence::{
        combine::MatrixCombiner,
        normalize::relative_weight_matrix,
        profile::{ObjectProfile, PresentFormat},
    },
    environment::{EnvironmentRegistry, ResolvedEnvironment},
    error::Result,
    format::{
        index::FormatIndex,
        report::{read_report_dir, DataObject},
        PerScheme, Scheme,
    },
    matcher::{all_formats_known, merge_rankings, rank_by_bm25, rank_by_cooccurrence, ranking::Ranking},
    model::CorpusModel,
    utils::sparse::CscMatrix,
};

/// Scores of one environment for one object
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnvironmentScore {
    pub environment: String,
    pub co_occurrence: f64,
    pub bm25: f64,
    pub combined: f64,
    /// every identified format of the object is readable
    pub all_formats_known: bool,
    /// `all_formats_known` and the object has no unknown files
    pub all_formats_readable: bool,
}

/// Ranking report of one data object
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingResult {
    pub name: String,
    pub scheme: Scheme,
    pub file_count: usize,
    pub unknown_count: usize,
    pub formats: Vec<PresentFormat>,
    /// false when neither scorer produced any evidence
    pub ranking_possible: bool,
    /// in environment id order, empty when `ranking_possible` is false
    pub environments: Vec<EnvironmentScore>,
}

impl RankingResult {
    /// Environment names by descending combined score
    pub fn best(&self) -> Ranking {
        let mut ranking = Ranking::new(
            self.environments
                .iter()
                .map(|e| (e.environment.clone(), e.combined))
                .collect(),
        );
        ranking.sort_by_score();
        ranking
    }

    pub fn score(&self, environment: &str) -> Option<&EnvironmentScore> {
        self.environments.iter().find(|e| e.environment == environment)
    }
}

/// Co-occurrence only report of one data object (raw, unnormalized scores)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoOccurrenceReport {
    pub name: String,
    pub file_count: usize,
    pub unknown_count: usize,
    pub formats: Vec<PresentFormat>,
    pub scores: Vec<CoOccurrenceScore>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoOccurrenceScore {
    pub environment: String,
    pub co_occurrence: f64,
    pub all_formats_known: bool,
    pub all_formats_readable: bool,
}

/// Per-object intermediate state of a query
struct ObjectQuery {
    profile: ObjectProfile,
    environments: Vec<ResolvedEnvironment>,
    affinity: CscMatrix<f64>,
    presence: CscMatrix<f64>,
    formats: Vec<PresentFormat>,
}

/// Ranks environments for data objects against a trained corpus
///
/// The global matrices of both schemes are combined once at construction.
/// Queries may meet identifiers the corpus never saw; each query assigns them
/// ids in its own copy of the model's format index, so neither the shared
/// model nor later queries see them.
#[derive(Debug, Clone)]
pub struct Recommender {
    model: Arc<CorpusModel>,
    registry: EnvironmentRegistry,
    combiner: MatrixCombiner,
    params: Bm25Params,
    globals: PerScheme<CscMatrix<f64>>,
}

impl Recommender {
    pub fn new(model: Arc<CorpusModel>, registry: EnvironmentRegistry, config: &ScoringConfig) -> Result<Self> {
        config.validate()?;
        let combiner = MatrixCombiner::new(config);
        let globals = PerScheme::from_fn(|scheme| model.scheme(scheme).global_matrix(&combiner));
        log::info!(
            "recommender ready: {} environments, {} training objects",
            registry.len(),
            model.object_count()
        );
        Ok(Self {
            model,
            registry,
            combiner,
            params: Bm25Params { k: config.bm25_k, b: config.bm25_b },
            globals,
        })
    }

    #[inline]
    pub fn model(&self) -> &Arc<CorpusModel> {
        &self.model
    }

    #[inline]
    pub fn registry(&self) -> &EnvironmentRegistry {
        &self.registry
    }

    fn prepare(&self, object: &DataObject) -> Result<ObjectQuery> {
        let scheme = object.scheme;
        let mut index: FormatIndex = self.model.scheme(scheme).index.clone();
        let profile = ObjectProfile::build(object, &mut index);
        let environments = self.registry.resolve(scheme, &mut index);
        let dim = index.dim();

        let (object_counts, directory_counts) = profile.local_matrices(dim)?;
        let local = self.combiner.local_matrix(
            &relative_weight_matrix(&object_counts),
            &relative_weight_matrix(&directory_counts),
        );
        let presence = profile.presence(dim)?;
        let affinity = self.combiner.affinity(&local, &self.globals[scheme], &presence)?;
        let formats = profile.present_formats(&index);
        Ok(ObjectQuery { profile, environments, affinity, presence, formats })
    }

    /// Full ranking: co-occurrence and BM25, normalized and merged
    pub fn rank_object(&self, object: &DataObject) -> Result<RankingResult> {
        let query = self.prepare(object)?;
        let profile = &query.profile;
        let co_occurrence = rank_by_cooccurrence(&query.affinity, &query.environments);
        let bm25 = rank_by_bm25(
            &self.model.scheme(object.scheme).bm25,
            &profile.term_frequency,
            profile.document_length(),
            &query.environments,
            self.params,
        );
        let known = all_formats_known(&query.presence, &query.environments);

        let environments = match merge_rankings(&co_occurrence, &bm25) {
            Some(merged) => merged
                .into_iter()
                .map(|(environment, score)| {
                    let all_formats_known = known.get(&environment).copied().unwrap_or(false);
                    EnvironmentScore {
                        co_occurrence: score.co_occurrence,
                        bm25: score.bm25,
                        combined: score.combined,
                        all_formats_known,
                        all_formats_readable: all_formats_known && profile.unknown_count == 0,
                        environment,
                    }
                })
                .collect(),
            None => {
                log::info!("no ranking possible for `{}`", object.name);
                Vec::new()
            }
        };
        Ok(RankingResult {
            name: object.name.clone(),
            scheme: object.scheme,
            file_count: profile.file_count,
            unknown_count: profile.unknown_count,
            ranking_possible: !environments.is_empty(),
            formats: query.formats,
            environments,
        })
    }

    /// Co-occurrence score and readability checks only
    pub fn rank_by_cooccurrence_only(&self, object: &DataObject) -> Result<CoOccurrenceReport> {
        let query = self.prepare(object)?;
        let ranking = rank_by_cooccurrence(&query.affinity, &query.environments);
        let known = all_formats_known(&query.presence, &query.environments);
        let unknown_count = query.profile.unknown_count;
        let scores = ranking
            .list
            .into_iter()
            .map(|(environment, co_occurrence)| {
                let all_formats_known = known.get(&environment).copied().unwrap_or(false);
                CoOccurrenceScore {
                    co_occurrence,
                    all_formats_known,
                    all_formats_readable: all_formats_known && unknown_count == 0,
                    environment,
                }
            })
            .collect();
        Ok(CoOccurrenceReport {
            name: object.name.clone(),
            file_count: query.profile.file_count,
            unknown_count,
            formats: query.formats,
            scores,
        })
    }

    /// Rank every report of a directory, skipping malformed ones
    pub fn rank_dir(&self, dir: impl AsRef<Path>) -> Result<Vec<RankingResult>> {
        let mut results = Vec::new();
        for (name, parsed) in read_report_dir(dir)? {
            let object = match parsed {
                Ok(object) => object,
                Err(e) => {
                    log::warn!("skipping data object {}: {}", name, e);
                    continue;
                }
            };
            match self.rank_object(&object) {
                Ok(result) => results.push(result),
                Err(e) => log::warn!("failed to rank {}: {}", name, e),
            }
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::trainer::CorpusTrainer;

    fn setup(config: ScoringConfig) -> Recommender {
        let mut trainer = CorpusTrainer::new();
        trainer.add_object(
            &DataObject::new("t1", Scheme::Pronom)
                .with_file("a.doc", &["fmt/40"])
                .with_file("b.xls", &["fmt/61"]),
        );
        trainer.add_object(
            &DataObject::new("t2", Scheme::Pronom)
                .with_file("a.pdf", &["fmt/18"])
                .with_file("b.pdf", &["fmt/18"]),
        );
        let model = Arc::new(trainer.finish().unwrap());
        let mut registry = EnvironmentRegistry::new();
        registry.add_readable("office", Scheme::Pronom, ["fmt/40", "fmt/61"]);
        registry.add_readable("reader", Scheme::Pronom, ["fmt/18"]);
        registry.add_readable("word", Scheme::Pronom, ["fmt/40"]);
        Recommender::new(model, registry, &config).unwrap()
    }

    #[test]
    fn office_object_ranks_office_first() {
        let rec = setup(ScoringConfig::default());
        let object = DataObject::new("q", Scheme::Pronom)
            .with_file("x.doc", &["fmt/40"])
            .with_file("y.xls", &["fmt/61"]);
        let result = rec.rank_object(&object).unwrap();
        assert!(result.ranking_possible);
        assert_eq!(result.environments.len(), 3);
        assert_eq!(result.best().list[0].0, "office");
        let office = result.score("office").unwrap();
        assert!(office.all_formats_known && office.all_formats_readable);
        assert!(!result.score("word").unwrap().all_formats_known);
        let combined: f64 = result.environments.iter().map(|e| e.combined).sum();
        assert!((combined - 1.0).abs() < 1e-9);
    }

    #[test]
    fn unseen_formats_do_not_touch_the_model() {
        let rec = setup(ScoringConfig::default());
        let before = rec.model().scheme(Scheme::Pronom).index.len();
        let object = DataObject::new("q", Scheme::Pronom)
            .with_file("x.new", &["fmt/1000"])
            .with_file("y.new", &["fmt/1001"]);
        let result = rec.rank_object(&object).unwrap();
        assert_eq!(rec.model().scheme(Scheme::Pronom).index.len(), before);
        assert!(!result.ranking_possible);
        assert!(result.environments.is_empty());
        assert_eq!(result.formats.len(), 2);
    }

    #[test]
    fn unknown_files_block_readability() {
        let rec = setup(ScoringConfig::default());
        let object = DataObject::new("q", Scheme::Pronom)
            .with_file("x.pdf", &["fmt/18"])
            .with_file("y", &["UNKNOWN"]);
        let result = rec.rank_object(&object).unwrap();
        assert!(result.ranking_possible);
        let reader = result.score("reader").unwrap();
        assert!(reader.all_formats_known);
        assert!(!reader.all_formats_readable);
        assert_eq!(result.unknown_count, 1);
    }

    #[test]
    fn cooccurrence_only_report_uses_raw_scores() {
        let rec = setup(ScoringConfig::default());
        let object = DataObject::new("q", Scheme::Pronom)
            .with_file("x.doc", &["fmt/40"])
            .with_file("y.xls", &["fmt/61"]);
        let report = rec.rank_by_cooccurrence_only(&object).unwrap();
        let office = report.scores.iter().find(|s| s.environment == "office").unwrap();
        // per orientation: local 1 + 1, global 1 + 1
        assert!((office.co_occurrence - 8.0).abs() < 1e-9);
        assert_eq!(report.scores.iter().find(|s| s.environment == "reader").unwrap().co_occurrence, 0.0);
    }

    #[test]
    fn untrained_scheme_never_yields_nan() {
        let mut trainer = CorpusTrainer::new();
        trainer.add_object(&DataObject::new("w", Scheme::Wikidata).with_file("a", &["Q1"]).with_file("b", &["Q2"]));
        let model = Arc::new(trainer.finish().unwrap());
        let mut registry = EnvironmentRegistry::new();
        registry.add_readable("e", Scheme::Pronom, ["fmt/1", "fmt/2"]);
        registry.add_readable("f", Scheme::Pronom, ["fmt/3"]);
        let object = DataObject::new("p", Scheme::Pronom)
            .with_file("a", &["fmt/1"])
            .with_file("b", &["fmt/2"]);

        for config in [
            ScoringConfig { bm25_b: 0.0, ..ScoringConfig::default() },
            ScoringConfig { bm25_k: 0.0, ..ScoringConfig::default() },
            ScoringConfig::default(),
        ] {
            let rec = Recommender::new(Arc::clone(&model), registry.clone(), &config).unwrap();
            let result = rec.rank_object(&object).unwrap();
            assert!(result.ranking_possible);
            for score in &result.environments {
                assert!(score.co_occurrence.is_finite() && score.bm25.is_finite() && score.combined.is_finite());
                assert_eq!(score.bm25, 0.0);
            }
            assert_eq!(result.best().list[0].0, "e");
            assert_eq!(result.best().len(), 2);
        }
    }

    #[test]
    fn unseen_ids_do_not_carry_over_between_queries() {
        let rec = setup(ScoringConfig::default());
        let fresh = setup(ScoringConfig::default());
        let before = rec.model().scheme(Scheme::Pronom).index.dim();
        let novel = DataObject::new("n", Scheme::Pronom)
            .with_file("x", &["fmt/1000"])
            .with_file("y", &["fmt/1001"]);
        let known = DataObject::new("k", Scheme::Pronom)
            .with_file("x.doc", &["fmt/40"])
            .with_file("y.pdf", &["fmt/1001"]);
        rec.rank_object(&novel).unwrap();
        assert_eq!(rec.rank_object(&known).unwrap(), fresh.rank_object(&known).unwrap());
        assert_eq!(rec.model().scheme(Scheme::Pronom).index.dim(), before);
    }

    #[test]
    fn non_finite_config_is_rejected() {
        let model = Arc::new(CorpusModel::default());
        let config = ScoringConfig { local: f64::INFINITY, ..ScoringConfig::default() };
        assert!(Recommender::new(model, EnvironmentRegistry::new(), &config).is_err());
    }
}
