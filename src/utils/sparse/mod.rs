pub mod serde;

use num::Num;

use crate::error::{EnvMatchError, Result};

/// Square sparse matrix in compressed sparse column layout
///
/// - `col_ptr[j]..col_ptr[j + 1]` is the slice of column `j` in `row_ind` / `values`
/// - rows are strictly ascending inside a column
/// - explicit zeros are never stored
///
/// Generic over the element type so raw co-occurrence counts (`u32`) and
/// relative weights (`f64`) share one representation. Operations that divide
/// or take roots go through `Into<f64>` and return `CscMatrix<f64>`.
#[derive(Debug, Clone, PartialEq)]
pub struct CscMatrix<N = f64>
where
    N: Num + Copy,
{
    dim: usize,
    col_ptr: Vec<usize>,
    row_ind: Vec<u32>,
    values: Vec<N>,
}

impl<N> CscMatrix<N>
where
    N: Num + Copy,
{
    /// Empty `dim x dim` matrix
    pub fn zeros(dim: usize) -> Self {
        Self {
            dim,
            col_ptr: vec![0; dim + 1],
            row_ind: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Build from `(row, col, value)` triplets
    ///
    /// Duplicated coordinates are summed, zero results dropped.
    /// A coordinate outside `dim` is a [`EnvMatchError::DimensionMismatch`].
    pub fn from_triplets<I>(dim: usize, triplets: I) -> Result<Self>
    where
        I: IntoIterator<Item = (u32, u32, N)>,
    {
        let mut columns: Vec<Vec<(u32, N)>> = vec![Vec::new(); dim];
        for (row, col, val) in triplets {
            let bound = row.max(col) as usize;
            if bound >= dim {
                return Err(EnvMatchError::DimensionMismatch { expected: dim, actual: bound + 1 });
            }
            columns[col as usize].push((row, val));
        }
        Ok(Self::from_columns(dim, columns))
    }

    /// Diagonal matrix with `value` at every `(id, id)`
    pub fn diagonal<I>(dim: usize, ids: I, value: N) -> Result<Self>
    where
        I: IntoIterator<Item = u32>,
    {
        Self::from_triplets(dim, ids.into_iter().map(|id| (id, id, value)))
    }

    fn from_columns(dim: usize, columns: Vec<Vec<(u32, N)>>) -> Self {
        let nnz_hint = columns.iter().map(Vec::len).sum();
        let mut col_ptr = Vec::with_capacity(dim + 1);
        let mut row_ind = Vec::with_capacity(nnz_hint);
        let mut values = Vec::with_capacity(nnz_hint);
        col_ptr.push(0);
        for mut column in columns {
            column.sort_by_key(|(row, _)| *row);
            let mut merged: Vec<(u32, N)> = Vec::with_capacity(column.len());
            for (row, val) in column {
                match merged.last_mut() {
                    Some((r, v)) if *r == row => *v = *v + val,
                    _ => merged.push((row, val)),
                }
            }
            for (row, val) in merged {
                if !val.is_zero() {
                    row_ind.push(row);
                    values.push(val);
                }
            }
            col_ptr.push(row_ind.len());
        }
        Self { dim, col_ptr, row_ind, values }
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// number of stored (non-zero) entries
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Rows and values of column `col`
    #[inline]
    pub fn column(&self, col: usize) -> (&[u32], &[N]) {
        if col >= self.dim {
            return (&[], &[]);
        }
        let range = self.col_ptr[col]..self.col_ptr[col + 1];
        (&self.row_ind[range.clone()], &self.values[range])
    }

    /// Stored value at `(row, col)`, `None` when absent or out of range
    #[inline]
    pub fn get(&self, row: u32, col: u32) -> Option<N> {
        let (rows, vals) = self.column(col as usize);
        rows.binary_search(&row).ok().map(|k| vals[k])
    }

    /// Non-zero entries as `(row, col, value)` in column-major order
    pub fn raw_iter(&self) -> impl Iterator<Item = (u32, u32, N)> + '_ {
        (0..self.dim).flat_map(move |col| {
            (self.col_ptr[col]..self.col_ptr[col + 1])
                .map(move |k| (self.row_ind[k], col as u32, self.values[k]))
        })
    }

    /// Copy with a larger (or equal) dimension; entries are unchanged
    pub fn resized(&self, dim: usize) -> Self {
        if dim <= self.dim {
            return self.clone();
        }
        let mut grown = self.clone();
        let last = *grown.col_ptr.last().unwrap_or(&0);
        grown.col_ptr.resize(dim + 1, last);
        grown.dim = dim;
        grown
    }

    /// Element-wise map, zero results are dropped
    pub fn map<M, F>(&self, mut f: F) -> CscMatrix<M>
    where
        M: Num + Copy,
        F: FnMut(N) -> M,
    {
        let columns: Vec<Vec<(u32, M)>> = (0..self.dim)
            .map(|col| {
                let (rows, vals) = self.column(col);
                rows.iter().zip(vals).map(|(r, v)| (*r, f(*v))).collect()
            })
            .collect();
        CscMatrix::from_columns(self.dim, columns)
    }

    /// `factor * self`
    #[inline]
    pub fn scale(&self, factor: N) -> Self {
        if factor.is_zero() {
            return Self::zeros(self.dim);
        }
        self.map(|v| v * factor)
    }

    /// `self + other`; the result takes the larger dimension
    pub fn add(&self, other: &Self) -> Self {
        let dim = self.dim.max(other.dim);
        let columns: Vec<Vec<(u32, N)>> = (0..dim)
            .map(|col| {
                let (ra, va) = self.column(col);
                let (rb, vb) = other.column(col);
                ra.iter()
                    .zip(va)
                    .chain(rb.iter().zip(vb))
                    .map(|(r, v)| (*r, *v))
                    .collect()
            })
            .collect();
        Self::from_columns(dim, columns)
    }

    /// `a * self + b * other`
    #[inline]
    pub fn linear_combination(&self, a: N, other: &Self, b: N) -> Self {
        self.scale(a).add(&other.scale(b))
    }

    /// Sum of the stored entries of every column
    pub fn column_sums(&self) -> Vec<N> {
        (0..self.dim)
            .map(|col| self.column(col).1.iter().fold(N::zero(), |acc, v| acc + *v))
            .collect()
    }

    /// Ids `i` with a non-zero `(i, i)` entry, in ascending order
    pub fn diagonal_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.raw_iter().filter(|(r, c, _)| r == c).map(|(r, _, _)| r)
    }

    /// `M[i,j] == M[j,i]` for every stored entry
    pub fn is_symmetric(&self) -> bool {
        self.raw_iter().all(|(r, c, v)| self.get(c, r) == Some(v))
    }

    pub fn has_zero_diagonal(&self) -> bool {
        self.diagonal_ids().next().is_none()
    }
}

impl<N> Default for CscMatrix<N>
where
    N: Num + Copy,
{
    fn default() -> Self {
        Self::zeros(0)
    }
}

impl<N> CscMatrix<N>
where
    N: Num + Copy + Into<f64>,
{
    /// Column-wise L1 normalization
    ///
    /// Every column is divided by the sum of its absolute values. A column
    /// that sums to zero is copied unchanged instead of divided.
    pub fn column_l1_normalize(&self) -> CscMatrix<f64> {
        let columns: Vec<Vec<(u32, f64)>> = (0..self.dim)
            .map(|col| {
                let (rows, vals) = self.column(col);
                let sum: f64 = vals.iter().map(|v| Into::<f64>::into(*v).abs()).sum();
                rows.iter()
                    .zip(vals)
                    .map(|(r, v)| {
                        let v: f64 = (*v).into();
                        (*r, if sum != 0.0 { v / sum } else { v })
                    })
                    .collect()
            })
            .collect();
        CscMatrix::from_columns(self.dim, columns)
    }

    /// `sqrt(self^T ⊙ self)`, i.e. `W[i,j] = sqrt(M[i,j] * M[j,i])`
    pub fn symmetric_geometric_mean(&self) -> CscMatrix<f64> {
        let columns: Vec<Vec<(u32, f64)>> = (0..self.dim)
            .map(|col| {
                let (rows, vals) = self.column(col);
                rows.iter()
                    .zip(vals)
                    .filter_map(|(r, v)| {
                        // 転置側の値 M[j,i] が無ければ積は 0
                        let mirrored = self.get(col as u32, *r)?;
                        let product = Into::<f64>::into(*v) * Into::<f64>::into(mirrored);
                        Some((*r, product.sqrt()))
                    })
                    .collect()
            })
            .collect();
        CscMatrix::from_columns(self.dim, columns)
    }

    pub fn to_f64(&self) -> CscMatrix<f64> {
        self.map(|v| v.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CscMatrix<u32> {
        CscMatrix::from_triplets(3, vec![(0, 1, 2), (1, 0, 2), (2, 1, 1), (1, 2, 1), (0, 1, 1)]).unwrap()
    }

    #[test]
    fn triplets_are_merged_and_sorted() {
        let m = sample();
        assert_eq!(m.nnz(), 4);
        assert_eq!(m.get(0, 1), Some(3));
        assert_eq!(m.get(1, 0), Some(2));
        assert_eq!(m.get(2, 2), None);
        let entries: Vec<_> = m.raw_iter().collect();
        assert_eq!(entries, vec![(1, 0, 2), (0, 1, 3), (2, 1, 1), (1, 2, 1)]);
    }

    #[test]
    fn out_of_range_triplet_is_rejected() {
        let res = CscMatrix::from_triplets(2, vec![(0u32, 2u32, 1u32)]);
        assert!(matches!(res, Err(EnvMatchError::DimensionMismatch { expected: 2, actual: 3 })));
    }

    #[test]
    fn zero_results_are_not_stored() {
        let m = CscMatrix::from_triplets(2, vec![(0, 1, 1.0), (0, 1, -1.0), (1, 0, 0.0)]).unwrap();
        assert!(m.is_empty());
        assert!(m.scale(0.0).is_empty());
    }

    #[test]
    fn add_takes_the_larger_dimension() {
        let a = CscMatrix::from_triplets(2, vec![(0, 1, 1.0)]).unwrap();
        let b = CscMatrix::from_triplets(3, vec![(0, 1, 2.0), (2, 0, 4.0)]).unwrap();
        let c = a.add(&b);
        assert_eq!(c.dim(), 3);
        assert_eq!(c.get(0, 1), Some(3.0));
        assert_eq!(c.get(2, 0), Some(4.0));
        let d = a.linear_combination(2.0, &b, 0.5);
        assert_eq!(d.get(0, 1), Some(3.0));
        assert_eq!(d.get(2, 0), Some(2.0));
    }

    #[test]
    fn column_normalization_sums_to_one_or_stays_zero() {
        let m = CscMatrix::from_triplets(3, vec![(0, 1, 3u32), (2, 1, 1), (1, 0, 5)]).unwrap();
        let n = m.column_l1_normalize();
        let sums = n.column_sums();
        assert!((sums[0] - 1.0).abs() < 1e-12);
        assert!((sums[1] - 1.0).abs() < 1e-12);
        assert_eq!(sums[2], 0.0);
        assert_eq!(n.get(0, 1), Some(0.75));
    }

    #[test]
    fn geometric_mean_is_symmetric_and_drops_one_sided_entries() {
        let m = CscMatrix::from_triplets(3, vec![(0, 1, 0.5), (1, 0, 0.125), (2, 0, 0.25)]).unwrap();
        let w = m.symmetric_geometric_mean();
        assert!(w.is_symmetric());
        assert_eq!(w.get(0, 1), Some(0.25));
        assert_eq!(w.get(2, 0), None);
    }

    #[test]
    fn diagonal_helpers() {
        let d = CscMatrix::diagonal(4, vec![3, 1], 1.0).unwrap();
        assert_eq!(d.diagonal_ids().collect::<Vec<_>>(), vec![1, 3]);
        assert!(!d.has_zero_diagonal());
        assert!(sample().has_zero_diagonal());
    }

    #[test]
    fn resized_keeps_entries() {
        let m = sample().resized(5);
        assert_eq!(m.dim(), 5);
        assert_eq!(m.get(0, 1), Some(3));
        assert_eq!(m.column(4).0.len(), 0);
    }
}
