//! The matrix store: axes, metadata tables and assays that always move together.

use super::assay::Assay;
use super::axis::Axis;
use super::metadata::{ColumnValues, MetadataTable};
use super::selector::Selector;
use crate::core::error::{Result, VarexpError};
use log::{debug, info};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fmt;

/// Feature × sample store with per-axis metadata and any number of equally-shaped assays.
///
/// Metadata attachment mutates in place; [`MatrixStore::subset`] never touches
/// `self` and returns an independent store.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixStore {
    pub(crate) feature_axis: Axis,
    pub(crate) sample_axis: Axis,
    pub(crate) feature_metadata: MetadataTable,
    pub(crate) sample_metadata: MetadataTable,
    pub(crate) assays: BTreeMap<String, Assay>,
}

impl MatrixStore {
    /// Assemble a store, checking every assay against `(features, samples)`.
    pub fn new<I, S>(feature_axis: Axis, sample_axis: Axis, assays: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Assay)>,
        S: Into<String>,
    {
        let expected = (feature_axis.len(), sample_axis.len());
        let mut checked = BTreeMap::new();
        for (name, assay) in assays {
            let name = name.into();
            validate_shape(&name, expected, assay.shape())?;
            checked.insert(name, assay);
        }

        debug!(
            "Constructed store {}×{} with assays {:?}",
            expected.0,
            expected.1,
            checked.keys().collect::<Vec<_>>()
        );

        Ok(Self {
            feature_metadata: MetadataTable::new(feature_axis.len()),
            sample_metadata: MetadataTable::new(sample_axis.len()),
            feature_axis,
            sample_axis,
            assays: checked,
        })
    }

    pub fn feature_axis(&self) -> &Axis {
        &self.feature_axis
    }

    pub fn sample_axis(&self) -> &Axis {
        &self.sample_axis
    }

    #[inline]
    pub fn feature_axis_length(&self) -> usize {
        self.feature_axis.len()
    }

    #[inline]
    pub fn sample_axis_length(&self) -> usize {
        self.sample_axis.len()
    }

    /// `(features, samples)`
    pub fn shape(&self) -> (usize, usize) {
        (self.feature_axis.len(), self.sample_axis.len())
    }

    pub fn feature_metadata(&self) -> &MetadataTable {
        &self.feature_metadata
    }

    pub fn sample_metadata(&self) -> &MetadataTable {
        &self.sample_metadata
    }

    /// Replace the feature metadata table; rejected unless it spans the feature axis.
    pub fn attach_feature_metadata(&mut self, table: MetadataTable) -> Result<()> {
        if table.len() != self.feature_axis.len() {
            return Err(VarexpError::length_mismatch(
                "feature metadata",
                self.feature_axis.len(),
                table.len(),
            ));
        }
        info!("Attached feature metadata: {}", table);
        self.feature_metadata = table;
        Ok(())
    }

    /// Replace the sample metadata table; rejected unless it spans the sample axis.
    pub fn attach_sample_metadata(&mut self, table: MetadataTable) -> Result<()> {
        if table.len() != self.sample_axis.len() {
            return Err(VarexpError::length_mismatch(
                "sample metadata",
                self.sample_axis.len(),
                table.len(),
            ));
        }
        info!("Attached sample metadata: {}", table);
        self.sample_metadata = table;
        Ok(())
    }

    pub fn set_feature_column(
        &mut self,
        name: &str,
        values: impl Into<ColumnValues>,
    ) -> Result<()> {
        self.feature_metadata.set_column(name, values)
    }

    pub fn set_sample_column(&mut self, name: &str, values: impl Into<ColumnValues>) -> Result<()> {
        self.sample_metadata.set_column(name, values)
    }

    /// Insert or replace an assay of the store's shape.
    pub fn set_assay(&mut self, name: &str, assay: Assay) -> Result<()> {
        validate_shape(name, self.shape(), assay.shape())?;
        self.assays.insert(name.to_string(), assay);
        Ok(())
    }

    pub fn get_assay(&self, name: &str) -> Result<&Assay> {
        self.assays
            .get(name)
            .ok_or_else(|| VarexpError::AssayNotFound(name.to_string()))
    }

    pub fn remove_assay(&mut self, name: &str) -> Result<Assay> {
        self.assays
            .remove(name)
            .ok_or_else(|| VarexpError::AssayNotFound(name.to_string()))
    }

    /// Assay names in sorted order.
    pub fn assay_names(&self) -> Vec<&str> {
        self.assays.keys().map(String::as_str).collect()
    }

    /// Coordinated slice of axes, both metadata tables and every assay.
    ///
    /// Both selectors are resolved before anything is built, so any error
    /// leaves no partial result. `self` is never modified.
    pub fn subset(&self, features: &Selector, samples: &Selector) -> Result<MatrixStore> {
        let feature_positions = features.resolve(&self.feature_axis)?;
        let sample_positions = samples.resolve(&self.sample_axis)?;

        let feature_axis = self.feature_axis.select(&feature_positions)?;
        let sample_axis = self.sample_axis.select(&sample_positions)?;
        let feature_metadata = self.feature_metadata.select(&feature_positions)?;
        let sample_metadata = self.sample_metadata.select(&sample_positions)?;

        let assays = self
            .assays
            .par_iter()
            .map(|(name, assay)| {
                debug!("Slicing assay '{}'", name);
                assay
                    .select(&feature_positions, &sample_positions)
                    .map(|sliced| (name.clone(), sliced))
            })
            .collect::<Result<BTreeMap<String, Assay>>>()?;

        info!(
            "Subset {}×{} -> {}×{} across {} assays",
            self.feature_axis.len(),
            self.sample_axis.len(),
            feature_axis.len(),
            sample_axis.len(),
            assays.len()
        );

        Ok(MatrixStore {
            feature_axis,
            sample_axis,
            feature_metadata,
            sample_metadata,
            assays,
        })
    }

    /// Per-sample flag: true when any selected feature has a positive value in `assay`.
    ///
    /// NaN entries never count as carried.
    pub fn carrier_mask(&self, assay: &str, features: &Selector) -> Result<Vec<bool>> {
        let matrix = self.get_assay(assay)?.csr();
        let positions = features.resolve(&self.feature_axis)?;

        let mut carriers = vec![false; self.sample_axis.len()];
        for feature in positions {
            let row = matrix.row(feature);
            for (&sample, &value) in row.col_indices().iter().zip(row.values()) {
                if value > 0.0 {
                    carriers[sample] = true;
                }
            }
        }
        Ok(carriers)
    }

    pub fn summary(&self) -> StoreSummary {
        StoreSummary {
            n_features: self.feature_axis.len(),
            n_samples: self.sample_axis.len(),
            assays: self
                .assays
                .iter()
                .map(|(name, assay)| (name.clone(), assay.nnz()))
                .collect(),
            feature_columns: self
                .feature_metadata
                .column_names()
                .map(str::to_string)
                .collect(),
            sample_columns: self
                .sample_metadata
                .column_names()
                .map(str::to_string)
                .collect(),
        }
    }
}

fn validate_shape(name: &str, expected: (usize, usize), actual: (usize, usize)) -> Result<()> {
    if expected != actual {
        return Err(VarexpError::ShapeMismatch {
            context: format!("assay '{}'", name),
            expected,
            actual,
        });
    }
    Ok(())
}

/// Dimensions and layer inventory of a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSummary {
    pub n_features: usize,
    pub n_samples: usize,
    /// `(name, stored entries)`
    pub assays: Vec<(String, usize)>,
    pub feature_columns: Vec<String>,
    pub sample_columns: Vec<String>,
}

impl fmt::Display for StoreSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "dim: {} features × {} samples", self.n_features, self.n_samples)?;
        write!(f, "assays({}):", self.assays.len())?;
        for (name, nnz) in &self.assays {
            write!(f, " {} [{} stored]", name, nnz)?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "feature metadata({}): {}",
            self.feature_columns.len(),
            self.feature_columns.join(" ")
        )?;
        write!(
            f,
            "sample metadata({}): {}",
            self.sample_columns.len(),
            self.sample_columns.join(" ")
        )
    }
}
