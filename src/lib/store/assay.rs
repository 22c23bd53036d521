//! Assay layer: named feature × sample numeric arrays backed by CSR storage.

use crate::core::error::{Result, VarexpError};
use crate::core::sparse::SparseOps;
use nalgebra_sparse::CsrMatrix;
use serde::{Deserialize, Serialize};

/// A two-dimensional numeric array indexed `[feature, sample]`.
///
/// Absent entries read as `0.0`; missing calls are stored explicitly as NaN.
#[derive(Debug, Clone)]
pub struct Assay {
    matrix: CsrMatrix<f64>,
}

impl Assay {
    pub fn from_csr(matrix: CsrMatrix<f64>) -> Self {
        Self { matrix }
    }

    pub fn zeros(n_features: usize, n_samples: usize) -> Self {
        Self {
            matrix: CsrMatrix::zeros(n_features, n_samples),
        }
    }

    /// Build from dense rows, one per feature.
    pub fn from_dense(rows: &[Vec<f64>]) -> Result<Self> {
        let n_features = rows.len();
        let n_samples = rows.first().map_or(0, Vec::len);
        Ok(Self {
            matrix: SparseOps::from_dense_rows(n_features, n_samples, rows)?,
        })
    }

    pub fn from_triplets(
        n_features: usize,
        n_samples: usize,
        triplets: Vec<(usize, usize, f64)>,
    ) -> Result<Self> {
        Ok(Self {
            matrix: SparseOps::from_triplets(n_features, n_samples, triplets)?,
        })
    }

    /// `(features, samples)`
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.matrix.nrows(), self.matrix.ncols())
    }

    pub fn get(&self, feature: usize, sample: usize) -> Result<f64> {
        let (rows, cols) = self.shape();
        if feature >= rows {
            return Err(VarexpError::IndexOutOfRange {
                index: feature,
                length: rows,
            });
        }
        if sample >= cols {
            return Err(VarexpError::IndexOutOfRange {
                index: sample,
                length: cols,
            });
        }
        Ok(SparseOps::get(&self.matrix, feature, sample))
    }

    pub fn csr(&self) -> &CsrMatrix<f64> {
        &self.matrix
    }

    pub fn nnz(&self) -> usize {
        self.matrix.nnz()
    }

    pub fn density(&self) -> f64 {
        SparseOps::get_density_stats(&self.matrix).0
    }

    /// Per-feature totals, NaN skipped.
    pub fn row_sums(&self) -> Vec<f64> {
        SparseOps::compute_row_sums(&self.matrix)
    }

    /// Per-sample totals, NaN skipped.
    pub fn col_sums(&self) -> Vec<f64> {
        SparseOps::compute_col_sums(&self.matrix)
    }

    /// Dense copy of one feature row; `feature` must be in range.
    pub(crate) fn dense_row(&self, feature: usize) -> Vec<f64> {
        let mut dense = vec![0.0; self.matrix.ncols()];
        let row = self.matrix.row(feature);
        for (&col, &value) in row.col_indices().iter().zip(row.values()) {
            dense[col] = value;
        }
        dense
    }

    /// Cartesian re-index: entry `(i, j)` is `self[feature_positions[i], sample_positions[j]]`.
    pub fn select(&self, feature_positions: &[usize], sample_positions: &[usize]) -> Result<Assay> {
        Ok(Self {
            matrix: SparseOps::select(&self.matrix, feature_positions, sample_positions)?,
        })
    }

    fn to_triplets(&self) -> AssayTriplets {
        let (row_offsets, col_indices, values) = self.matrix.csr_data();
        AssayTriplets {
            n_features: self.matrix.nrows(),
            n_samples: self.matrix.ncols(),
            row_offsets: row_offsets.to_vec(),
            col_indices: col_indices.to_vec(),
            values: values.to_vec(),
        }
    }
}

/// Cell-wise equality: absent entries equal stored zeros and NaN equals NaN.
impl PartialEq for Assay {
    fn eq(&self, other: &Self) -> bool {
        self.shape() == other.shape()
            && (0..self.matrix.nrows()).all(|row| {
                let a = self.matrix.row(row);
                let b = other.matrix.row(row);
                rows_match(a.col_indices(), a.values(), b.col_indices(), b.values())
            })
    }
}

/// Merge two sorted sparse rows, reading a missing column as zero.
fn rows_match(cols_a: &[usize], vals_a: &[f64], cols_b: &[usize], vals_b: &[f64]) -> bool {
    let same = |x: f64, y: f64| x == y || (x.is_nan() && y.is_nan());
    let (mut i, mut j) = (0, 0);
    while i < cols_a.len() || j < cols_b.len() {
        let (x, y) = match (cols_a.get(i), cols_b.get(j)) {
            (Some(ca), Some(cb)) if ca == cb => {
                i += 1;
                j += 1;
                (vals_a[i - 1], vals_b[j - 1])
            }
            (Some(ca), Some(cb)) if ca < cb => {
                i += 1;
                (vals_a[i - 1], 0.0)
            }
            (Some(_), None) => {
                i += 1;
                (vals_a[i - 1], 0.0)
            }
            _ => {
                j += 1;
                (0.0, vals_b[j - 1])
            }
        };
        if !same(x, y) {
            return false;
        }
    }
    true
}

/// Serde form of an assay: raw CSR arrays.
#[derive(Serialize, Deserialize)]
struct AssayTriplets {
    n_features: usize,
    n_samples: usize,
    row_offsets: Vec<usize>,
    col_indices: Vec<usize>,
    values: Vec<f64>,
}

impl Serialize for Assay {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_triplets().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Assay {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = AssayTriplets::deserialize(deserializer)?;
        CsrMatrix::try_from_csr_data(
            raw.n_features,
            raw.n_samples,
            raw.row_offsets,
            raw.col_indices,
            raw.values,
        )
        .map(Assay::from_csr)
        .map_err(|e| serde::de::Error::custom(format!("invalid CSR data: {:?}", e)))
    }
}
