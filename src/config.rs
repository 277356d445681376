use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::{EnvMatchError, Result};

/// Scalar weights of the ranking pipeline
///
/// Field names follow the `config.json` layout of the training data
/// directory: `global`, `global_dir`, `local`, `local_dir`, `offset`, and the
/// optional Okapi BM25 control parameters `bm25_k` / `bm25_b`.
///
/// Values are only checked for being finite numbers. No range is enforced,
/// negative or huge weights simply produce degenerate rankings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// weight of the corpus-wide object co-occurrence matrix
    pub global: f64,
    /// weight of the corpus-wide directory co-occurrence matrix
    pub global_dir: f64,
    /// weight of the per-object co-occurrence matrix
    pub local: f64,
    /// weight of the per-object directory co-occurrence matrix
    pub local_dir: f64,
    /// self-affinity added on the diagonal of every present format
    pub offset: f64,
    /// BM25 term frequency saturation
    #[serde(default = "default_bm25_k")]
    pub bm25_k: f64,
    /// BM25 document length normalization
    #[serde(default = "default_bm25_b")]
    pub bm25_b: f64,
}

fn default_bm25_k() -> f64 {
    1.2
}

fn default_bm25_b() -> f64 {
    0.75
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            global: 1.0,
            global_dir: 1.0,
            local: 1.0,
            local_dir: 1.0,
            offset: 0.0,
            bm25_k: default_bm25_k(),
            bm25_b: default_bm25_b(),
        }
    }
}

impl ScoringConfig {
    /// Read and validate a `config.json`
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(EnvMatchError::MissingState(path.to_path_buf()));
        }
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: ScoringConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects NaN / infinite values, nothing else
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("global", self.global),
            ("global_dir", self.global_dir),
            ("local", self.local),
            ("local_dir", self.local_dir),
            ("offset", self.offset),
            ("bm25_k", self.bm25_k),
            ("bm25_b", self.bm25_b),
        ];
        for (field, value) in fields {
            if !value.is_finite() {
                return Err(EnvMatchError::InvalidConfig { field, value });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_original_key_names_and_defaults_bm25() {
        let raw = r#"{"global": 0.5, "global_dir": 0.25, "local": 1, "local_dir": 2, "offset": 0.1}"#;
        let config = ScoringConfig::from_json_str(raw).unwrap();
        assert_eq!(config.global, 0.5);
        assert_eq!(config.global_dir, 0.25);
        assert_eq!(config.local, 1.0);
        assert_eq!(config.local_dir, 2.0);
        assert_eq!(config.offset, 0.1);
        assert_eq!(config.bm25_k, 1.2);
        assert_eq!(config.bm25_b, 0.75);
    }

    #[test]
    fn negative_weights_are_accepted() {
        let raw = r#"{"global": -3, "global_dir": 0, "local": 0, "local_dir": 0, "offset": -1, "bm25_k": 0, "bm25_b": 5}"#;
        assert!(ScoringConfig::from_json_str(raw).is_ok());
    }

    #[test]
    fn non_finite_values_are_rejected() {
        let config = ScoringConfig { offset: f64::NAN, ..ScoringConfig::default() };
        match config.validate() {
            Err(EnvMatchError::InvalidConfig { field, .. }) => assert_eq!(field, "offset"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn non_numeric_values_fail_to_parse() {
        let raw = r#"{"global": "high", "global_dir": 0, "local": 0, "local_dir": 0, "offset": 0}"#;
        assert!(matches!(ScoringConfig::from_json_str(raw), Err(EnvMatchError::Json(_))));
    }

    #[test]
    fn missing_file_is_missing_state() {
        let res = ScoringConfig::from_json_file("/definitely/not/here/config.json");
        assert!(matches!(res, Err(EnvMatchError::MissingState(_))));
    }
}
