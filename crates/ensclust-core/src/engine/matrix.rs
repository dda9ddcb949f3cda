use crate::core::models::transform::Transformation;
use nalgebra::{DMatrix, DVectorView};
use std::collections::BTreeMap;

/// Square, symmetric, zero-diagonal matrix of pairwise minimum RMSDs in model order.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    values: DMatrix<f64>,
}

impl DistanceMatrix {
    /// Creates an all-zero matrix for `model_count` models.
    pub fn zeros(model_count: usize) -> Self {
        Self {
            values: DMatrix::zeros(model_count, model_count),
        }
    }

    /// Wraps a raw matrix, returning `None` unless it is square, symmetric and zero on the
    /// diagonal.
    pub fn from_matrix(values: DMatrix<f64>) -> Option<Self> {
        let n = values.nrows();
        if values.ncols() != n {
            return None;
        }
        for i in 0..n {
            if values[(i, i)] != 0.0 {
                return None;
            }
            for j in (i + 1)..n {
                if values[(i, j)] != values[(j, i)] {
                    return None;
                }
            }
        }
        Some(Self { values })
    }

    pub fn len(&self) -> usize {
        self.values.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        self.values.get((i, j)).copied()
    }

    /// Sets the distance of an unordered pair in both triangle halves.
    pub(crate) fn set_pair(&mut self, i: usize, j: usize, distance: f64) {
        self.values[(i, j)] = distance;
        self.values[(j, i)] = distance;
    }

    /// The distances from model `i` to every model; the matrix is symmetric, so this is
    /// both its row and its column.
    pub fn row(&self, i: usize) -> DVectorView<'_, f64> {
        self.values.column(i)
    }

    pub fn as_matrix(&self) -> &DMatrix<f64> {
        &self.values
    }
}

/// Transformation attached to every unordered model pair.
///
/// Lookup is symmetric: `get(i, j)` and `get(j, i)` return the same value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformationTable {
    entries: BTreeMap<(usize, usize), Transformation>,
}

impl TransformationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, i: usize, j: usize, transformation: Transformation) {
        self.entries.insert(ordered(i, j), transformation);
    }

    pub fn get(&self, i: usize, j: usize) -> Option<&Transformation> {
        self.entries.get(&ordered(i, j))
    }

    /// Number of unordered pairs in the table.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries as `(i, j, transformation)` with `i < j`, in ascending pair order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &Transformation)> {
        self.entries.iter().map(|(&(i, j), t)| (i, j, t))
    }
}

fn ordered(i: usize, j: usize) -> (usize, usize) {
    if i <= j { (i, j) } else { (j, i) }
}

/// The complete outcome of a pairwise build over an ensemble.
#[derive(Debug, Clone, PartialEq)]
pub struct PairwiseResult {
    pub distances: DistanceMatrix,
    pub transformations: TransformationTable,
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Translation3, UnitQuaternion};

    #[test]
    fn set_pair_fills_both_halves() {
        let mut matrix = DistanceMatrix::zeros(3);
        matrix.set_pair(0, 2, 1.5);

        assert_eq!(matrix.get(0, 2), Some(1.5));
        assert_eq!(matrix.get(2, 0), Some(1.5));
        assert_eq!(matrix.get(1, 1), Some(0.0));
        assert_eq!(matrix.get(3, 0), None);
        assert_eq!(matrix.row(2).iter().copied().collect::<Vec<_>>(), vec![1.5, 0.0, 0.0]);
    }

    #[test]
    fn from_matrix_rejects_asymmetric_or_nonzero_diagonal() {
        let asymmetric = DMatrix::from_row_slice(2, 2, &[0.0, 1.0, 2.0, 0.0]);
        let diagonal = DMatrix::from_row_slice(2, 2, &[0.5, 1.0, 1.0, 0.0]);
        let rectangular = DMatrix::<f64>::zeros(2, 3);
        let valid = DMatrix::from_row_slice(2, 2, &[0.0, 1.0, 1.0, 0.0]);

        assert!(DistanceMatrix::from_matrix(asymmetric).is_none());
        assert!(DistanceMatrix::from_matrix(diagonal).is_none());
        assert!(DistanceMatrix::from_matrix(rectangular).is_none());
        assert_eq!(DistanceMatrix::from_matrix(valid).unwrap().len(), 2);
    }

    #[test]
    fn transformation_lookup_is_symmetric() {
        let mut table = TransformationTable::new();
        let t = Transformation::from_parts(
            Translation3::new(1.0, 2.0, 3.0),
            UnitQuaternion::from_euler_angles(0.1, 0.2, 0.3),
        );
        table.insert(4, 1, t);

        assert_eq!(table.get(1, 4), Some(&t));
        assert_eq!(table.get(4, 1), Some(&t));
        assert_eq!(table.len(), 1);
        assert_eq!(table.iter().next().map(|(i, j, _)| (i, j)), Some((1, 4)));
    }
}
