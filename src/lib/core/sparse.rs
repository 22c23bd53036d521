//! Sparse matrix utilities shared by the assay layer

use crate::core::error::{Result, VarexpError};
use itertools::Itertools;
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

pub struct SparseOps;

impl SparseOps {
    /// Create a CSR matrix from `(row, col, value)` triplets via COO conversion.
    ///
    /// Duplicate coordinates are summed, as nalgebra_sparse does for COO input.
    pub fn from_triplets(
        nrows: usize,
        ncols: usize,
        triplets: Vec<(usize, usize, f64)>,
    ) -> Result<CsrMatrix<f64>> {
        if nrows == 0 || ncols == 0 || triplets.is_empty() {
            return Ok(CsrMatrix::zeros(nrows, ncols));
        }

        for &(row, col, _) in &triplets {
            if row >= nrows || col >= ncols {
                return Err(VarexpError::InvalidInput(format!(
                    "Index ({}, {}) exceeds matrix dimensions ({}, {})",
                    row, col, nrows, ncols
                )));
            }
        }

        let (row_indices, col_indices, values): (Vec<_>, Vec<_>, Vec<_>) =
            triplets.into_iter().multiunzip();

        let coo = CooMatrix::try_from_triplets(nrows, ncols, row_indices, col_indices, values)
            .map_err(|e| VarexpError::SparseMatrix(format!("COO creation failed: {:?}", e)))?;

        Ok(CsrMatrix::from(&coo))
    }

    /// Build a CSR matrix from dense rows. Zeros are dropped, NaN is stored explicitly.
    pub fn from_dense_rows(
        nrows: usize,
        ncols: usize,
        rows: &[Vec<f64>],
    ) -> Result<CsrMatrix<f64>> {
        if rows.len() != nrows {
            return Err(VarexpError::ShapeMismatch {
                context: "dense rows".to_string(),
                expected: (nrows, ncols),
                actual: (rows.len(), rows.first().map_or(ncols, Vec::len)),
            });
        }

        let mut row_offsets = Vec::with_capacity(nrows + 1);
        let mut col_indices = Vec::new();
        let mut values = Vec::new();
        row_offsets.push(0);

        for row in rows {
            if row.len() != ncols {
                return Err(VarexpError::ShapeMismatch {
                    context: "dense rows".to_string(),
                    expected: (nrows, ncols),
                    actual: (nrows, row.len()),
                });
            }
            for (col, &value) in row.iter().enumerate() {
                if value != 0.0 {
                    col_indices.push(col);
                    values.push(value);
                }
            }
            row_offsets.push(col_indices.len());
        }

        Ok(CsrMatrix::try_from_csr_data(
            nrows,
            ncols,
            row_offsets,
            col_indices,
            values,
        )?)
    }

    /// Re-index a matrix by row and column position lists.
    ///
    /// Entry `(i, j)` of the result is `matrix[rows[i], cols[j]]`. Both lists may
    /// reorder; positions must already be validated against the matrix shape.
    pub fn select(
        matrix: &CsrMatrix<f64>,
        rows: &[usize],
        cols: &[usize],
    ) -> Result<CsrMatrix<f64>> {
        if let Some(&bad) = rows.iter().find(|&&r| r >= matrix.nrows()) {
            return Err(VarexpError::IndexOutOfRange {
                index: bad,
                length: matrix.nrows(),
            });
        }
        if let Some(&bad) = cols.iter().find(|&&c| c >= matrix.ncols()) {
            return Err(VarexpError::IndexOutOfRange {
                index: bad,
                length: matrix.ncols(),
            });
        }

        let new_nrows = rows.len();
        let new_ncols = cols.len();
        if new_nrows == 0 || new_ncols == 0 {
            return Ok(CsrMatrix::zeros(new_nrows, new_ncols));
        }

        // old column -> every new column it lands in
        let mut col_map: FxHashMap<usize, SmallVec<[usize; 2]>> = FxHashMap::default();
        for (new_col, &old_col) in cols.iter().enumerate() {
            col_map.entry(old_col).or_default().push(new_col);
        }

        let selected_rows: Vec<Vec<(usize, f64)>> = rows
            .par_iter()
            .map(|&old_row| {
                let row = matrix.row(old_row);
                let mut entries: Vec<(usize, f64)> = row
                    .col_indices()
                    .iter()
                    .zip(row.values())
                    .filter_map(|(old_col, &value)| {
                        col_map
                            .get(old_col)
                            .map(|targets| targets.iter().map(move |&c| (c, value)))
                    })
                    .flatten()
                    .collect();
                entries.sort_unstable_by_key(|&(col, _)| col);
                entries
            })
            .collect();

        let nnz: usize = selected_rows.iter().map(Vec::len).sum();
        let mut row_offsets = Vec::with_capacity(new_nrows + 1);
        let mut col_indices = Vec::with_capacity(nnz);
        let mut values = Vec::with_capacity(nnz);
        row_offsets.push(0);
        for entries in selected_rows {
            for (col, value) in entries {
                col_indices.push(col);
                values.push(value);
            }
            row_offsets.push(col_indices.len());
        }

        CsrMatrix::try_from_csr_data(new_nrows, new_ncols, row_offsets, col_indices, values)
            .map_err(|e| {
                VarexpError::SparseMatrix(format!("Failed to create selected matrix: {:?}", e))
            })
    }

    /// Value at `(row, col)`; absent entries read as zero.
    pub fn get(matrix: &CsrMatrix<f64>, row: usize, col: usize) -> f64 {
        let row = matrix.row(row);
        match row.col_indices().binary_search(&col) {
            Ok(idx) => row.values()[idx],
            Err(_) => 0.0,
        }
    }

    /// Row sums skipping NaN entries
    pub fn compute_row_sums(matrix: &CsrMatrix<f64>) -> Vec<f64> {
        (0..matrix.nrows())
            .into_par_iter()
            .map(|row_idx| {
                matrix
                    .row(row_idx)
                    .values()
                    .iter()
                    .filter(|v| !v.is_nan())
                    .sum::<f64>()
            })
            .collect()
    }

    /// Column sums skipping NaN entries, reduced in parallel over row chunks
    pub fn compute_col_sums(matrix: &CsrMatrix<f64>) -> Vec<f64> {
        let ncols = matrix.ncols();
        let chunk_size = std::cmp::max(1, matrix.nrows() / rayon::current_num_threads());

        (0..matrix.nrows())
            .into_par_iter()
            .chunks(chunk_size)
            .map(|chunk| {
                let mut local_sums = vec![0f64; ncols];
                for row_idx in chunk {
                    let row = matrix.row(row_idx);
                    for (&col_idx, &val) in row.col_indices().iter().zip(row.values()) {
                        if !val.is_nan() {
                            local_sums[col_idx] += val;
                        }
                    }
                }
                local_sums
            })
            .reduce(
                || vec![0f64; ncols],
                |mut acc, local| {
                    for (sum, val) in acc.iter_mut().zip(local) {
                        *sum += val;
                    }
                    acc
                },
            )
    }

    /// Get matrix density statistics: (density, nnz, total elements)
    pub fn get_density_stats(matrix: &CsrMatrix<f64>) -> (f64, usize, usize) {
        let total_elements = matrix.nrows() * matrix.ncols();
        let nnz = matrix.nnz();
        let density = if total_elements > 0 {
            nnz as f64 / total_elements as f64
        } else {
            0.0
        };
        (density, nnz, total_elements)
    }
}
