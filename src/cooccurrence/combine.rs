use crate::{config::ScoringConfig, error::Result, utils::sparse::CscMatrix};

/// Weighted combination of corpus-wide and per-object weight matrices
///
/// ```text
/// Global   = g * W_global_obj + gdir * W_global_dir
/// Local    = l * W_local_obj  + ldir * W_local_dir
/// Affinity = partial_add(Local, Global) + offset * D
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatrixCombiner {
    pub global: f64,
    pub global_dir: f64,
    pub local: f64,
    pub local_dir: f64,
    pub offset: f64,
}

impl MatrixCombiner {
    pub fn new(config: &ScoringConfig) -> Self {
        Self {
            global: config.global,
            global_dir: config.global_dir,
            local: config.local,
            local_dir: config.local_dir,
            offset: config.offset,
        }
    }

    #[inline]
    pub fn global_matrix(&self, object: &CscMatrix<f64>, directory: &CscMatrix<f64>) -> CscMatrix<f64> {
        object.linear_combination(self.global, directory, self.global_dir)
    }

    #[inline]
    pub fn local_matrix(&self, object: &CscMatrix<f64>, directory: &CscMatrix<f64>) -> CscMatrix<f64> {
        object.linear_combination(self.local, directory, self.local_dir)
    }

    /// Final affinity matrix of one object
    pub fn affinity(
        &self,
        local: &CscMatrix<f64>,
        global: &CscMatrix<f64>,
        presence: &CscMatrix<f64>,
    ) -> Result<CscMatrix<f64>> {
        let scoped = partial_add(local, global)?;
        Ok(scoped.add(&presence.scale(self.offset)))
    }
}

/// `local + global` restricted to the non-zero coordinates of `local`
///
/// Global statistics re-weight the pairs that co-occur in the object itself
/// but never introduce a pair the object does not have.
pub fn partial_add(local: &CscMatrix<f64>, global: &CscMatrix<f64>) -> Result<CscMatrix<f64>> {
    CscMatrix::from_triplets(
        local.dim(),
        local
            .raw_iter()
            .map(|(r, c, v)| (r, c, v + global.get(r, c).unwrap_or(0.0))),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(dim: usize, entries: &[(u32, u32, f64)]) -> CscMatrix<f64> {
        CscMatrix::from_triplets(dim, entries.iter().copied()).unwrap()
    }

    #[test]
    fn partial_add_never_adds_global_only_pairs() {
        let local = matrix(3, &[(0, 1, 0.5), (1, 0, 0.5)]);
        let global = matrix(3, &[(0, 1, 0.25), (1, 0, 0.25), (1, 2, 0.75), (2, 1, 0.75)]);
        let sum = partial_add(&local, &global).unwrap();
        assert_eq!(sum.get(0, 1), Some(0.75));
        assert_eq!(sum.get(1, 0), Some(0.75));
        assert_eq!(sum.get(1, 2), None);
        assert_eq!(sum.nnz(), 2);
    }

    #[test]
    fn global_of_smaller_dimension_is_accepted() {
        let local = matrix(4, &[(0, 3, 1.0), (3, 0, 1.0), (0, 1, 1.0), (1, 0, 1.0)]);
        let global = matrix(2, &[(0, 1, 2.0), (1, 0, 2.0)]);
        let sum = partial_add(&local, &global).unwrap();
        assert_eq!(sum.dim(), 4);
        assert_eq!(sum.get(0, 1), Some(3.0));
        assert_eq!(sum.get(3, 0), Some(1.0));
    }

    #[test]
    fn weights_and_offset_are_applied() {
        let config = ScoringConfig {
            global: 2.0,
            global_dir: 0.0,
            local: 1.0,
            local_dir: 3.0,
            offset: 0.5,
            ..ScoringConfig::default()
        };
        let combiner = MatrixCombiner::new(&config);
        let obj = matrix(2, &[(0, 1, 1.0), (1, 0, 1.0)]);
        let dir = matrix(2, &[(0, 1, 0.5), (1, 0, 0.5)]);
        let global = combiner.global_matrix(&obj, &dir);
        assert_eq!(global.get(0, 1), Some(2.0));
        let local = combiner.local_matrix(&obj, &dir);
        assert_eq!(local.get(0, 1), Some(2.5));
        let presence = CscMatrix::diagonal(2, vec![0, 1], 1.0).unwrap();
        let affinity = combiner.affinity(&local, &global, &presence).unwrap();
        assert_eq!(affinity.get(0, 1), Some(4.5));
        assert_eq!(affinity.get(0, 0), Some(0.5));
        assert_eq!(affinity.get(1, 1), Some(0.5));
    }

    #[test]
    fn zero_offset_leaves_the_diagonal_empty() {
        let combiner = MatrixCombiner::new(&ScoringConfig::default());
        let local = matrix(2, &[(0, 1, 1.0), (1, 0, 1.0)]);
        let presence = CscMatrix::diagonal(2, vec![0, 1], 1.0).unwrap();
        let affinity = combiner.affinity(&local, &CscMatrix::zeros(2), &presence).unwrap();
        assert!(affinity.has_zero_diagonal());
    }
}
