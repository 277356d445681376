use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use serde::{de::DeserializeOwned, Serialize};

use crate::{
    bm25::Bm25Stats,
    config::ScoringConfig,
    environment::EnvironmentRegistry,
    error::{EnvMatchError, Result},
    format::{index::FormatIndex, PerScheme, Scheme},
    model::{CorpusModel, SchemeModel},
    utils::sparse::CscMatrix,
};

const FORMAT_INDEX: &str = "format_index.json";
const OBJECT_COUNTS: &str = "object_counts.json";
const DIRECTORY_COUNTS: &str = "directory_counts.json";
const OBJECT_WEIGHTS: &str = "object_weights.json";
const DIRECTORY_WEIGHTS: &str = "directory_weights.json";
const BM25_STATS: &str = "bm25.json";
const ENVIRONMENTS: &str = "environments.json";
const CONFIG: &str = "config.json";
const SNAPSHOT: &str = "model.cbor";

/// Directory holding the persisted state of a training corpus
///
/// ```text
/// <root>/config.json
/// <root>/environments.json
/// <root>/model.cbor                 (optional single-file snapshot)
/// <root>/<scheme>/format_index.json
/// <root>/<scheme>/object_counts.json
/// <root>/<scheme>/directory_counts.json
/// <root>/<scheme>/object_weights.json
/// <root>/<scheme>/directory_weights.json
/// <root>/<scheme>/bm25.json
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusStore {
    root: PathBuf,
}

impl CorpusStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn scheme_dir(&self, scheme: Scheme) -> PathBuf {
        self.root.join(scheme.name())
    }

    pub fn save_model(&self, model: &CorpusModel) -> Result<()> {
        for (scheme, m) in model.schemes.iter() {
            let dir = self.scheme_dir(scheme);
            fs::create_dir_all(&dir)?;
            write_json(&dir.join(FORMAT_INDEX), &m.index)?;
            write_json(&dir.join(OBJECT_COUNTS), &m.object_counts)?;
            write_json(&dir.join(DIRECTORY_COUNTS), &m.directory_counts)?;
            write_json(&dir.join(OBJECT_WEIGHTS), &m.object_weights)?;
            write_json(&dir.join(DIRECTORY_WEIGHTS), &m.directory_weights)?;
            write_json(&dir.join(BM25_STATS), &m.bm25)?;
        }
        log::info!("saved corpus model to {}", self.root.display());
        Ok(())
    }

    /// Load both schemes; any missing file is [`EnvMatchError::MissingState`]
    pub fn load_model(&self) -> Result<CorpusModel> {
        let wikidata = self.load_scheme(Scheme::Wikidata)?;
        let pronom = self.load_scheme(Scheme::Pronom)?;
        log::info!("loaded corpus model from {}", self.root.display());
        Ok(CorpusModel { schemes: PerScheme::new(wikidata, pronom) })
    }

    fn load_scheme(&self, scheme: Scheme) -> Result<SchemeModel> {
        let dir = self.scheme_dir(scheme);
        let index: FormatIndex = read_json(&dir.join(FORMAT_INDEX))?;
        let object_counts: CscMatrix<u32> = read_json(&dir.join(OBJECT_COUNTS))?;
        let directory_counts: CscMatrix<u32> = read_json(&dir.join(DIRECTORY_COUNTS))?;
        let (object_weights, directory_weights) = load_weight_pair(&dir)?;
        let bm25: Bm25Stats = read_json(&dir.join(BM25_STATS))?;

        let dim = index.dim();
        for matrix_dim in [object_counts.dim(), directory_counts.dim(), object_weights.dim(), directory_weights.dim()] {
            if matrix_dim > dim {
                return Err(EnvMatchError::DimensionMismatch { expected: dim, actual: matrix_dim });
            }
        }
        Ok(SchemeModel {
            index,
            object_counts,
            directory_counts,
            object_weights,
            directory_weights,
            bm25,
        })
    }

    pub fn save_environments(&self, registry: &EnvironmentRegistry) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        write_json(&self.root.join(ENVIRONMENTS), registry)
    }

    /// Saved environments, or an empty registry when none were saved yet
    pub fn load_environments(&self) -> Result<EnvironmentRegistry> {
        match read_json(&self.root.join(ENVIRONMENTS)) {
            Err(EnvMatchError::MissingState(_)) => {
                log::info!("no environments saved yet, starting with an empty registry");
                Ok(EnvironmentRegistry::new())
            }
            other => other,
        }
    }

    pub fn save_config(&self, config: &ScoringConfig) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        write_json(&self.root.join(CONFIG), config)
    }

    pub fn load_config(&self) -> Result<ScoringConfig> {
        ScoringConfig::from_json_file(self.root.join(CONFIG))
    }

    /// Whole model as a single CBOR file
    pub fn save_snapshot(&self, model: &CorpusModel) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        let mut writer = BufWriter::new(File::create(self.root.join(SNAPSHOT))?);
        serde_cbor::to_writer(&mut writer, model)?;
        writer.flush()?;
        Ok(())
    }

    pub fn load_snapshot(&self) -> Result<CorpusModel> {
        let path = self.root.join(SNAPSHOT);
        if !path.exists() {
            return Err(EnvMatchError::MissingState(path));
        }
        let reader = BufReader::new(File::open(&path)?);
        Ok(serde_cbor::from_reader(reader)?)
    }

    /// Delete all persisted state (corpus reset)
    pub fn clear(&self) -> Result<()> {
        if self.root.exists() {
            fs::remove_dir_all(&self.root)?;
            log::info!("removed corpus state at {}", self.root.display());
        }
        Ok(())
    }
}

/// Object and directory weight matrices of one scheme
///
/// The two files are independent; they are read on two rayon tasks when
/// there are at least three processing units.
fn load_weight_pair(dir: &Path) -> Result<(CscMatrix<f64>, CscMatrix<f64>)> {
    let object_path = dir.join(OBJECT_WEIGHTS);
    let directory_path = dir.join(DIRECTORY_WEIGHTS);
    let load = || read_json::<CscMatrix<f64>>(&object_path);
    let load_dir = || read_json::<CscMatrix<f64>>(&directory_path);
    let (object, directory) = if parallel_load() {
        log::debug!("loading weight matrices of {} in parallel", dir.display());
        rayon::join(load, load_dir)
    } else {
        (load(), load_dir())
    };
    Ok((object?, directory?))
}

#[inline]
fn parallel_load() -> bool {
    std::thread::available_parallelism().map_or(false, |n| n.get() >= 3)
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Err(EnvMatchError::MissingState(path.to_path_buf()));
    }
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}
