//! Metadata tables keyed by axis position.
//!
//! Each table maps column names to typed value sequences whose length equals
//! the owning axis length. Row `i` of every column describes identifier `i`
//! of the axis.

use crate::core::error::{Result, VarexpError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A typed, ordered column of metadata values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnValues {
    Bool(Vec<bool>),
    Numeric(Vec<f64>),
    Text(Vec<String>),
}

impl ColumnValues {
    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Bool(v) => v.len(),
            ColumnValues::Numeric(v) => v.len(),
            ColumnValues::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ColumnValues::Bool(_) => "bool",
            ColumnValues::Numeric(_) => "numeric",
            ColumnValues::Text(_) => "text",
        }
    }

    pub fn as_bool(&self) -> Option<&[bool]> {
        match self {
            ColumnValues::Bool(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_numeric(&self) -> Option<&[f64]> {
        match self {
            ColumnValues::Numeric(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&[String]> {
        match self {
            ColumnValues::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Render the value at `row` for tabular output; `row` must be in range.
    pub(crate) fn display_at(&self, row: usize) -> String {
        match self {
            ColumnValues::Bool(v) => String::from(if v[row] { "TRUE" } else { "FALSE" }),
            ColumnValues::Numeric(v) if v[row].is_nan() => "NA".to_string(),
            ColumnValues::Numeric(v) => v[row].to_string(),
            ColumnValues::Text(v) => v[row].clone(),
        }
    }

    /// Positional gather; positions must be in range.
    fn take(&self, positions: &[usize]) -> ColumnValues {
        match self {
            ColumnValues::Bool(v) => ColumnValues::Bool(positions.iter().map(|&p| v[p]).collect()),
            ColumnValues::Numeric(v) => {
                ColumnValues::Numeric(positions.iter().map(|&p| v[p]).collect())
            }
            ColumnValues::Text(v) => {
                ColumnValues::Text(positions.iter().map(|&p| v[p].clone()).collect())
            }
        }
    }

    /// Element equality where NaN equals NaN, for content comparisons.
    fn same_content(&self, other: &ColumnValues) -> bool {
        match (self, other) {
            (ColumnValues::Numeric(a), ColumnValues::Numeric(b)) => {
                a.len() == b.len()
                    && a
                        .iter()
                        .zip(b)
                        .all(|(x, y)| x == y || (x.is_nan() && y.is_nan()))
            }
            _ => self == other,
        }
    }
}

impl From<Vec<bool>> for ColumnValues {
    fn from(v: Vec<bool>) -> Self {
        ColumnValues::Bool(v)
    }
}

impl From<Vec<f64>> for ColumnValues {
    fn from(v: Vec<f64>) -> Self {
        ColumnValues::Numeric(v)
    }
}

impl From<Vec<String>> for ColumnValues {
    fn from(v: Vec<String>) -> Self {
        ColumnValues::Text(v)
    }
}

impl From<Vec<&str>> for ColumnValues {
    fn from(v: Vec<&str>) -> Self {
        ColumnValues::Text(v.into_iter().map(str::to_string).collect())
    }
}

/// Column-name → values mapping aligned to one axis. Insertion order is kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataTable {
    axis_length: usize,
    columns: Vec<(String, ColumnValues)>,
}

impl MetadataTable {
    pub fn new(axis_length: usize) -> Self {
        Self {
            axis_length,
            columns: Vec::new(),
        }
    }

    /// Number of rows every column must carry.
    #[inline]
    pub fn len(&self) -> usize {
        self.axis_length
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.axis_length == 0
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|(n, _)| n == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &ColumnValues)> {
        self.columns.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Insert or overwrite a column. The table is untouched on a length mismatch.
    pub fn set_column(&mut self, name: &str, values: impl Into<ColumnValues>) -> Result<()> {
        let values = values.into();
        if values.len() != self.axis_length {
            return Err(VarexpError::length_mismatch(
                format!("metadata column '{}'", name),
                self.axis_length,
                values.len(),
            ));
        }
        match self.columns.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = values,
            None => self.columns.push((name.to_string(), values)),
        }
        Ok(())
    }

    pub fn get_column(&self, name: &str) -> Result<&ColumnValues> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
            .ok_or_else(|| VarexpError::ColumnNotFound(name.to_string()))
    }

    pub fn remove_column(&mut self, name: &str) -> Result<ColumnValues> {
        let idx = self
            .columns
            .iter()
            .position(|(n, _)| n == name)
            .ok_or_else(|| VarexpError::ColumnNotFound(name.to_string()))?;
        Ok(self.columns.remove(idx).1)
    }

    /// A boolean column as a mask.
    pub fn mask(&self, name: &str) -> Result<&[bool]> {
        let column = self.get_column(name)?;
        column.as_bool().ok_or_else(|| {
            VarexpError::InvalidInput(format!(
                "column '{}' is {}, not bool",
                name,
                column.kind()
            ))
        })
    }

    /// Positions where a boolean column is true.
    pub fn positions_where(&self, name: &str) -> Result<Vec<usize>> {
        Ok(mask_to_positions(self.mask(name)?))
    }

    /// New table with every column gathered at `positions`, in that order.
    pub fn select(&self, positions: &[usize]) -> Result<MetadataTable> {
        super::axis::check_positions(positions, self.axis_length)?;
        Ok(MetadataTable {
            axis_length: positions.len(),
            columns: self
                .columns
                .iter()
                .map(|(name, values)| (name.clone(), values.take(positions)))
                .collect(),
        })
    }
}

impl PartialEq for MetadataTable {
    fn eq(&self, other: &Self) -> bool {
        self.axis_length == other.axis_length
            && self.columns.len() == other.columns.len()
            && self
                .columns
                .iter()
                .zip(&other.columns)
                .all(|((na, va), (nb, vb))| na == nb && va.same_content(vb))
    }
}

impl fmt::Display for MetadataTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} rows", self.axis_length)?;
        for (name, values) in &self.columns {
            write!(f, ", {}<{}>", name, values.kind())?;
        }
        Ok(())
    }
}

/// Positions `i` where `mask[i]` is true.
pub fn mask_to_positions(mask: &[bool]) -> Vec<usize> {
    mask.iter()
        .enumerate()
        .filter_map(|(i, &keep)| if keep { Some(i) } else { None })
        .collect()
}

/// Boolean mask of `length` that is true exactly at `positions`.
pub fn positions_to_mask(length: usize, positions: &[usize]) -> Result<Vec<bool>> {
    super::axis::check_positions(positions, length)?;
    let mut mask = vec![false; length];
    for &p in positions {
        mask[p] = true;
    }
    Ok(mask)
}
