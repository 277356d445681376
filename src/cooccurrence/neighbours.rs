use serde::Serialize;

use crate::{
    format::{index::FormatIndex, FormatId},
    utils::sparse::CscMatrix,
};

/// Formats co-occurring with one format across the training corpus
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormatNeighbourhood {
    pub format: String,
    pub neighbours: Vec<Neighbour>,
}

/// Share of one partner format in the neighbourhood, per matrix
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Neighbour {
    pub format: String,
    pub object: f64,
    pub directory: f64,
    pub combined: f64,
}

impl FormatNeighbourhood {
    /// Neighbourhood of column `id`
    ///
    /// Partners are the non-zero rows of the object matrix. Each of the three
    /// value lists is divided by its own sum; a list summing to zero is kept
    /// as is.
    pub fn of(
        index: &FormatIndex,
        id: FormatId,
        object: &CscMatrix<f64>,
        directory: &CscMatrix<f64>,
        combined: &CscMatrix<f64>,
    ) -> Self {
        let (rows, values) = object.column(id as usize);
        let raw: Vec<(FormatId, f64, f64, f64)> = rows
            .iter()
            .zip(values)
            .map(|(r, v)| {
                (
                    *r,
                    *v,
                    directory.get(*r, id).unwrap_or(0.0),
                    combined.get(*r, id).unwrap_or(0.0),
                )
            })
            .collect();
        let sum_o: f64 = raw.iter().map(|e| e.1).sum();
        let sum_d: f64 = raw.iter().map(|e| e.2).sum();
        let sum_c: f64 = raw.iter().map(|e| e.3).sum();
        let share = |v: f64, sum: f64| if sum == 0.0 { v } else { v / sum };

        let neighbours = raw
            .into_iter()
            .map(|(r, o, d, c)| Neighbour {
                format: index.reverse(r).unwrap_or_default().to_string(),
                object: share(o, sum_o),
                directory: share(d, sum_d),
                combined: share(c, sum_c),
            })
            .collect();
        Self {
            format: index.reverse(id).unwrap_or_default().to_string(),
            neighbours,
        }
    }

    #[inline]
    pub fn is_isolated(&self) -> bool {
        self.neighbours.is_empty()
    }
}
