//! Sample annotation tables read from delimited text and aligned to a sample axis.

use crate::core::error::{Result, VarexpError};
use crate::core::fs::is_gzipped;
use crate::core::io::get_reader;
use crate::store::{Axis, ColumnValues, MatrixStore, MetadataTable};
use log::{debug, info, warn};
use rustc_hash::FxHashMap;
use std::path::Path;

/// Rows of sample annotations keyed by an identifier column, in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleTable {
    id_column: String,
    ids: Vec<String>,
    columns: Vec<(String, ColumnValues)>,
}

impl SampleTable {
    /// Build from raw string cells; column types are inferred.
    pub fn from_rows(
        id_column: &str,
        headers: &[String],
        rows: Vec<Vec<String>>,
    ) -> Result<Self> {
        let id_idx = headers
            .iter()
            .position(|h| h == id_column)
            .ok_or_else(|| VarexpError::ColumnNotFound(id_column.to_string()))?;

        let mut cells: Vec<Vec<String>> = vec![Vec::with_capacity(rows.len()); headers.len()];
        for (line, row) in rows.into_iter().enumerate() {
            if row.len() != headers.len() {
                return Err(VarexpError::length_mismatch(
                    format!("sample table row {}", line + 1),
                    headers.len(),
                    row.len(),
                ));
            }
            for (column, value) in cells.iter_mut().zip(row) {
                column.push(value);
            }
        }

        let ids = std::mem::take(&mut cells[id_idx]);
        let columns = headers
            .iter()
            .zip(cells)
            .enumerate()
            .filter(|(i, _)| *i != id_idx)
            .map(|(_, (name, raw))| (name.clone(), infer_column(raw)))
            .collect();

        Ok(Self {
            id_column: id_column.to_string(),
            ids,
            columns,
        })
    }

    pub fn id_column(&self) -> &str {
        &self.id_column
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    /// Reorder rows to follow `axis` and verify identity with its identifiers.
    ///
    /// Axis identifiers absent from the table, and identifiers repeated in the
    /// table, both fail with `Alignment`. The returned table carries the
    /// identifier column too, now equal to the axis order.
    pub fn align_to(&self, axis: &Axis) -> Result<MetadataTable> {
        let mut row_of: FxHashMap<&str, usize> = FxHashMap::default();
        for (row, id) in self.ids.iter().enumerate() {
            if row_of.insert(id.as_str(), row).is_some() {
                return Err(VarexpError::Alignment(format!(
                    "identifier '{}' appears more than once in column '{}'",
                    id, self.id_column
                )));
            }
        }

        let matched: Vec<Option<usize>> = axis.iter().map(|id| row_of.get(id).copied()).collect();

        for (position, (axis_id, row)) in axis.iter().zip(&matched).enumerate() {
            let matched_id = row.map(|r| self.ids[r].as_str());
            if matched_id != Some(axis_id) {
                return Err(VarexpError::Alignment(format!(
                    "sample axis position {} is '{}' but the table provides {}",
                    position,
                    axis_id,
                    matched_id.map_or_else(|| "no row".to_string(), |m| format!("'{}'", m))
                )));
            }
        }

        let order: Vec<usize> = matched.into_iter().flatten().collect();
        let unused = self.ids.len() - order.len();
        if unused > 0 {
            debug!("{} table rows have no matching sample and are dropped", unused);
        }

        let mut table = MetadataTable::new(axis.len());
        table.set_column(
            &self.id_column,
            order.iter().map(|&r| self.ids[r].clone()).collect::<Vec<_>>(),
        )?;
        for (name, values) in &self.columns {
            table.set_column(name, gather(values, &order))?;
        }
        Ok(table)
    }
}

impl MatrixStore {
    /// Align a sample table to the sample axis and attach it.
    ///
    /// Existing sample columns the table does not name are carried over;
    /// columns it does name are replaced. On any error the existing sample
    /// metadata is left as it was.
    pub fn attach_sample_table(&mut self, table: &SampleTable) -> Result<()> {
        let mut aligned = table.align_to(self.sample_axis())?;
        for (name, values) in self.sample_metadata().columns() {
            if aligned.has_column(name) {
                warn!("Sample column '{}' replaced by the sample table", name);
            } else {
                debug!("Keeping sample column '{}'", name);
                aligned.set_column(name, values.clone())?;
            }
        }
        self.attach_sample_metadata(aligned)
    }
}

/// Read a tab-delimited sample table with a header row. `.gz` paths are decompressed.
pub fn read_sample_table<P: AsRef<Path>>(path: P, id_column: &str) -> Result<SampleTable> {
    let path = path.as_ref();
    info!("Reading sample annotations from {}", path.display());

    let mut reader = get_reader(path, true, is_gzipped(path))?;
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let rows = reader
        .records()
        .map(|record| record.map(|r| r.iter().map(str::to_string).collect::<Vec<_>>()))
        .collect::<std::result::Result<Vec<_>, csv::Error>>()?;

    let table = SampleTable::from_rows(id_column, &headers, rows)?;
    info!(
        "Read {} sample rows with columns {:?}",
        table.len(),
        table.column_names().collect::<Vec<_>>()
    );
    Ok(table)
}

fn is_missing(value: &str) -> bool {
    let v = value.trim();
    v.is_empty() || v.eq_ignore_ascii_case("NA") || v.eq_ignore_ascii_case("nan")
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "TRUE" | "True" | "true" | "T" => Some(true),
        "FALSE" | "False" | "false" | "F" => Some(false),
        _ => None,
    }
}

/// Bool if every cell is a boolean literal, numeric if every non-missing cell
/// parses as a number, text otherwise.
fn infer_column(raw: Vec<String>) -> ColumnValues {
    if !raw.is_empty() && raw.iter().all(|v| parse_bool(v).is_some()) {
        return ColumnValues::Bool(raw.iter().filter_map(|v| parse_bool(v)).collect());
    }

    let numeric: Option<Vec<f64>> = raw
        .iter()
        .map(|v| {
            if is_missing(v) {
                Some(f64::NAN)
            } else {
                v.trim().parse::<f64>().ok()
            }
        })
        .collect();
    match numeric {
        Some(values) if raw.iter().any(|v| !is_missing(v)) => ColumnValues::Numeric(values),
        _ => ColumnValues::Text(raw),
    }
}

fn gather(values: &ColumnValues, order: &[usize]) -> ColumnValues {
    match values {
        ColumnValues::Bool(v) => ColumnValues::Bool(order.iter().map(|&r| v[r]).collect()),
        ColumnValues::Numeric(v) => ColumnValues::Numeric(order.iter().map(|&r| v[r]).collect()),
        ColumnValues::Text(v) => ColumnValues::Text(order.iter().map(|&r| v[r].clone()).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Assay;
    use std::fs;
    use tempfile::tempdir;

    fn store() -> MatrixStore {
        let features = Axis::new(["MN908947.3:241_C/T", "MN908947.3:23403_A/G"]).unwrap();
        let samples = Axis::new(["hCoV-19/A", "hCoV-19/B", "hCoV-19/C"]).unwrap();
        MatrixStore::new(features, samples, vec![("genotype", Assay::zeros(2, 3))]).unwrap()
    }

    fn write_table(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("samples.tsv");
        fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn reorders_to_axis_and_infers_types() {
        let (_dir, path) = write_table(
            "strain\tcountry\tage\tsequenced\n\
             hCoV-19/C\tPeru\t41\tTRUE\n\
             hCoV-19/A\tNorway\tNA\tFALSE\n\
             hCoV-19/B\tKenya\t7\tTRUE\n\
             hCoV-19/Z\tChile\t3\tFALSE\n",
        );
        let table = read_sample_table(&path, "strain").unwrap();
        assert_eq!(table.len(), 4);

        let mut store = store();
        store.attach_sample_table(&table).unwrap();
        let meta = store.sample_metadata();
        assert_eq!(
            meta.get_column("strain").unwrap().as_text().unwrap(),
            store.sample_axis().names()
        );
        assert_eq!(
            meta.get_column("country").unwrap().as_text().unwrap(),
            &["Norway".to_string(), "Kenya".to_string(), "Peru".to_string()]
        );
        let age = meta.get_column("age").unwrap().as_numeric().unwrap();
        assert!(age[0].is_nan());
        assert_eq!(&age[1..], &[7.0, 41.0]);
        assert_eq!(meta.mask("sequenced").unwrap(), &[false, true, true]);
    }

    #[test]
    fn missing_sample_raises_alignment_and_leaves_metadata_unset() {
        let (_dir, path) = write_table(
            "strain\tcountry\n\
             hCoV-19/A\tNorway\n\
             hCoV-19/C\tPeru\n",
        );
        let table = read_sample_table(&path, "strain").unwrap();
        let mut store = store();
        let err = store.attach_sample_table(&table).unwrap_err();
        assert!(matches!(err, VarexpError::Alignment(_)));
        assert_eq!(store.sample_metadata().width(), 0);
    }

    #[test]
    fn reattaching_keeps_flags_not_named_by_the_table() {
        let (_dir, path) = write_table(
            "strain\tcountry\n\
             hCoV-19/A\tNorway\n\
             hCoV-19/B\tKenya\n\
             hCoV-19/C\tPeru\n",
        );
        let table = read_sample_table(&path, "strain").unwrap();
        let mut store = store();
        store.set_sample_column("has_VOC1", vec![false, true, true]).unwrap();
        store.set_sample_column("country", vec!["?", "?", "?"]).unwrap();

        store.attach_sample_table(&table).unwrap();
        let meta = store.sample_metadata();
        assert_eq!(meta.width(), 3);
        assert_eq!(meta.mask("has_VOC1").unwrap(), &[false, true, true]);
        assert_eq!(
            meta.get_column("country").unwrap().as_text().unwrap(),
            &["Norway".to_string(), "Kenya".to_string(), "Peru".to_string()]
        );
    }

    #[test]
    fn duplicate_identifier_raises_alignment() {
        let table = SampleTable::from_rows(
            "id",
            &["id".to_string(), "x".to_string()],
            vec![
                vec!["hCoV-19/A".into(), "1".into()],
                vec!["hCoV-19/A".into(), "2".into()],
                vec!["hCoV-19/B".into(), "3".into()],
                vec!["hCoV-19/C".into(), "4".into()],
            ],
        )
        .unwrap();
        assert!(matches!(
            table.align_to(store().sample_axis()),
            Err(VarexpError::Alignment(_))
        ));
    }

    #[test]
    fn unknown_id_column() {
        let (_dir, path) = write_table("strain\tcountry\nhCoV-19/A\tNorway\n");
        assert!(matches!(
            read_sample_table(&path, "sample"),
            Err(VarexpError::ColumnNotFound(_))
        ));
    }

    #[test]
    fn ragged_rows_rejected() {
        let err = SampleTable::from_rows(
            "id",
            &["id".to_string(), "x".to_string()],
            vec![vec!["a".into()]],
        )
        .unwrap_err();
        assert!(matches!(err, VarexpError::LengthMismatch { .. }));
    }

    #[test]
    fn inference_rules() {
        assert_eq!(
            infer_column(vec!["NA".into(), "".into()]),
            ColumnValues::Text(vec!["NA".into(), "".into()])
        );
        assert!(matches!(
            infer_column(vec!["1.5".into(), "x".into()]),
            ColumnValues::Text(_)
        ));
        assert_eq!(
            infer_column(vec!["T".into(), "false".into()]),
            ColumnValues::Bool(vec![true, false])
        );
    }
}
