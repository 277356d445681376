use num::Num;

use crate::utils::sparse::CscMatrix;

/// Relative weight matrix of raw co-occurrence counts
///
/// 1. column-wise L1 normalization `N` (an all-zero column stays zero)
/// 2. `W[i,j] = sqrt(N[i,j] * N[j,i])`
///
/// Every entry of `W` lies in `[0, 1]`. Columns of `W` do not sum to one.
pub fn relative_weight_matrix<N>(raw: &CscMatrix<N>) -> CscMatrix<f64>
where
    N: Num + Copy + Into<f64>,
{
    raw.column_l1_normalize().symmetric_geometric_mean()
}
