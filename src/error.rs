use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EnvMatchError>;

#[derive(Error, Debug)]
pub enum EnvMatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CBOR error: {0}")]
    Cbor(#[from] serde_cbor::Error),

    /// identification report without any file entry
    #[error("data object `{0}` does not contain any files")]
    EmptyObject(String),

    #[error("data object `{0}` does not declare an identifier scheme")]
    MissingScheme(String),

    #[error("data object `{name}` declares {count} identifier schemes, exactly one is supported")]
    MultipleSchemes { name: String, count: usize },

    #[error("unsupported identifier scheme `{0}` (expected `wikidata` or `pronom`)")]
    UnknownScheme(String),

    #[error("invalid configuration value for `{field}`: {value}")]
    InvalidConfig { field: &'static str, value: f64 },

    /// persisted corpus state that a query run cannot do without
    #[error("missing persisted state: {0}")]
    MissingState(PathBuf),

    #[error("unknown environment `{0}`")]
    UnknownEnvironment(String),

    #[error("matrix dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

impl EnvMatchError {
    /// Malformed-input errors skip the current object; everything else is
    /// reported to the caller as is.
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            EnvMatchError::Json(_)
                | EnvMatchError::EmptyObject(_)
                | EnvMatchError::MissingScheme(_)
                | EnvMatchError::MultipleSchemes { .. }
                | EnvMatchError::UnknownScheme(_)
        )
    }
}
