/// This crate ranks rendering environments for digital objects using format
/// co-occurrence statistics and Okapi BM25.
pub mod bm25;
pub mod config;
pub mod cooccurrence;
pub mod environment;
pub mod error;
pub mod format;
pub mod matcher;
pub mod model;
pub mod store;
pub mod utils;

/// Recommender
/// The top-level query struct of this crate. It ranks every known environment
/// for a data object and reports whether the environment can read all of the
/// object's formats.
///
/// Internally, it holds:
/// - A shared, read-only trained corpus (`Arc<CorpusModel>`)
/// - The environment registry
/// - The combined global weight matrix of each scheme (computed once)
///
/// Each query builds the object's local co-occurrence matrices, combines them
/// with the global prior, scores environments by co-occurrence and by BM25 and
/// merges both normalized scores into one combined score.
///
/// Identifiers unseen in training get ids in a per-query copy of the format
/// index. The shared model is never modified.
pub use model::recommend::Recommender;

/// Ranking report of one data object
///
/// # Serialization
/// Supported (`Serialize` only), one JSON document per object.
pub use model::recommend::RankingResult;

/// Corpus Model
/// Immutable result of a training run, one `SchemeModel` per identifier scheme:
/// - The format index
/// - Raw object and directory co-occurrence counts
/// - Their relative weight matrices
/// - BM25 corpus statistics
///
/// # Serialization
/// Supported. `CorpusStore` writes it as a directory of JSON files or as a
/// single CBOR snapshot.
pub use model::CorpusModel;

/// Corpus Trainer
/// Accumulates corpus-wide statistics over training objects and freezes them
/// into a `CorpusModel`. Training can be resumed from a persisted model.
pub use model::trainer::CorpusTrainer;

/// Environment Registry
/// Known environments with dense ids and their readable format identifiers
/// per scheme. Environments come from definition files (resolved through a
/// `CapabilityLookup`) or from an environment/format catalog.
pub use environment::EnvironmentRegistry;

/// Source of the formats a program can read
pub use environment::CapabilityLookup;

/// Data Object
/// A named collection of files with candidate format matches, parsed and
/// validated from a format-identification report.
pub use format::report::DataObject;

/// Identifier scheme (`wikidata` or `pronom`)
pub use format::Scheme;

/// Scalar weights of the ranking pipeline (`config.json`)
pub use config::ScoringConfig;

/// Persisted corpus state directory
pub use store::CorpusStore;

pub use error::{EnvMatchError, Result};
