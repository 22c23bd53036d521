//! Tab-delimited export of metadata tables and assays.

use crate::core::error::Result;
use crate::core::fs::is_gzipped;
use crate::core::io::{finish_writer, get_writer};
use crate::store::{Axis, MatrixStore, MetadataTable};
use log::info;
use std::path::Path;

const COMPRESSION_LEVEL: u32 = 6;

fn export_table(axis: &Axis, table: &MetadataTable, id_header: &str, path: &Path) -> Result<()> {
    let mut writer = get_writer(Some(path), is_gzipped(path), COMPRESSION_LEVEL)?;

    let mut header = vec![id_header.to_string()];
    header.extend(table.column_names().map(str::to_string));
    writer.write_record(&header)?;

    let columns: Vec<_> = table.columns().map(|(_, values)| values).collect();
    for (row, id) in axis.iter().enumerate() {
        let mut record = Vec::with_capacity(columns.len() + 1);
        record.push(id.to_string());
        record.extend(columns.iter().map(|values| values.display_at(row)));
        writer.write_record(&record)?;
    }
    finish_writer(writer)?;
    info!(
        "Wrote {} rows × {} columns to {}",
        axis.len(),
        table.width(),
        path.display()
    );
    Ok(())
}

/// Feature identifiers plus every feature column.
pub fn export_feature_metadata<P: AsRef<Path>>(store: &MatrixStore, path: P) -> Result<()> {
    export_table(
        store.feature_axis(),
        store.feature_metadata(),
        "feature_id",
        path.as_ref(),
    )
}

/// Sample identifiers plus every sample column.
pub fn export_sample_metadata<P: AsRef<Path>>(store: &MatrixStore, path: P) -> Result<()> {
    export_table(
        store.sample_axis(),
        store.sample_metadata(),
        "sample_id",
        path.as_ref(),
    )
}

/// Dense feature × sample matrix with identifiers as row and column headers.
/// NaN is written as `NA`.
pub fn export_assay<P: AsRef<Path>>(store: &MatrixStore, assay: &str, path: P) -> Result<()> {
    let path = path.as_ref();
    let matrix = store.get_assay(assay)?;
    let mut writer = get_writer(Some(path), is_gzipped(path), COMPRESSION_LEVEL)?;

    let mut header = vec!["feature_id".to_string()];
    header.extend(store.sample_axis().iter().map(str::to_string));
    writer.write_record(&header)?;

    for (row, id) in store.feature_axis().iter().enumerate() {
        let mut record = Vec::with_capacity(store.sample_axis_length() + 1);
        record.push(id.to_string());
        record.extend(matrix.dense_row(row).into_iter().map(|v| {
            if v.is_nan() {
                "NA".to_string()
            } else {
                v.to_string()
            }
        }));
        writer.write_record(&record)?;
    }
    finish_writer(writer)?;
    info!(
        "Wrote assay '{}' ({}×{}) to {}",
        assay,
        store.feature_axis_length(),
        store.sample_axis_length(),
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Assay;
    use std::fs;
    use tempfile::tempdir;

    fn store() -> MatrixStore {
        let features = Axis::new(["f1", "f2"]).unwrap();
        let samples = Axis::new(["s1", "s2"]).unwrap();
        let gt = Assay::from_dense(&[vec![1.0, f64::NAN], vec![0.0, 2.0]]).unwrap();
        let mut store = MatrixStore::new(features, samples, vec![("genotype", gt)]).unwrap();
        store.set_feature_column("VOC1", vec![true, false]).unwrap();
        store.set_feature_column("qual", vec![12.5, f64::NAN]).unwrap();
        store
    }

    #[test]
    fn writes_feature_metadata() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("features.tsv");
        export_feature_metadata(&store(), &path).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "feature_id\tVOC1\tqual\nf1\tTRUE\t12.5\nf2\tFALSE\tNA\n"
        );
    }

    #[test]
    fn writes_dense_assay() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("genotype.tsv");
        export_assay(&store(), "genotype", &path).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "feature_id\ts1\ts2\nf1\t1\tNA\nf2\t0\t2\n"
        );
        assert!(export_assay(&store(), "depth", &path).is_err());
    }

    #[test]
    fn empty_sample_metadata_still_lists_ids() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("samples.tsv");
        export_sample_metadata(&store(), &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "sample_id\ns1\ns2\n");
    }

    #[test]
    fn gzipped_export_reads_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("genotype.tsv.gz");
        export_assay(&store(), "genotype", &path).unwrap();

        let mut reader = crate::core::io::get_reader(&path, true, true).unwrap();
        assert_eq!(
            reader.headers().unwrap().iter().collect::<Vec<_>>(),
            vec!["feature_id", "s1", "s2"]
        );
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].iter().collect::<Vec<_>>(), vec!["f2", "0", "2"]);
    }
}
