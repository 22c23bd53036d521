//! Store persistence.
//!
//! Layout: 4-byte magic `VXS1`, little-endian `u32` version, then a gzip stream
//! holding the bincode encoding of [`StoreSnapshot`].

use super::assay::Assay;
use super::axis::Axis;
use super::matrix_store::MatrixStore;
use super::metadata::MetadataTable;
use crate::core::error::{Result, VarexpError};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

pub const STORE_MAGIC: &[u8; 4] = b"VXS1";
pub const STORE_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct StoreSnapshot {
    feature_axis: Axis,
    sample_axis: Axis,
    feature_metadata: MetadataTable,
    sample_metadata: MetadataTable,
    assays: BTreeMap<String, Assay>,
}

impl MatrixStore {
    /// Serialize the whole store to `writer`.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(STORE_MAGIC)?;
        writer.write_all(&STORE_VERSION.to_le_bytes())?;

        let snapshot = StoreSnapshot {
            feature_axis: self.feature_axis.clone(),
            sample_axis: self.sample_axis.clone(),
            feature_metadata: self.feature_metadata.clone(),
            sample_metadata: self.sample_metadata.clone(),
            assays: self.assays.clone(),
        };

        let mut encoder = GzEncoder::new(writer, Compression::default());
        bincode::serialize_into(&mut encoder, &snapshot)?;
        encoder.finish()?.flush()?;
        Ok(())
    }

    /// Read a store written by [`MatrixStore::write_to`], re-checking every invariant.
    pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if &magic != STORE_MAGIC {
            return Err(VarexpError::Format(format!(
                "bad magic {:?}, expected {:?}",
                magic, STORE_MAGIC
            )));
        }

        let mut version = [0u8; 4];
        reader.read_exact(&mut version)?;
        let version = u32::from_le_bytes(version);
        if version != STORE_VERSION {
            return Err(VarexpError::Format(format!(
                "unsupported version {} (this build reads {})",
                version, STORE_VERSION
            )));
        }

        let snapshot: StoreSnapshot = bincode::deserialize_from(GzDecoder::new(reader))?;

        let mut store = MatrixStore::new(
            snapshot.feature_axis,
            snapshot.sample_axis,
            snapshot.assays,
        )?;
        store.attach_feature_metadata(validated(snapshot.feature_metadata)?)?;
        store.attach_sample_metadata(validated(snapshot.sample_metadata)?)?;
        Ok(store)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        info!(
            "Writing store {}×{} to {}",
            self.feature_axis_length(),
            self.sample_axis_length(),
            path.display()
        );
        self.write_to(BufWriter::new(File::create(path)?))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Reading store from {}", path.display());
        let store = Self::read_from(BufReader::new(File::open(path)?))?;
        info!(
            "Loaded store {}×{} with assays {:?}",
            store.feature_axis_length(),
            store.sample_axis_length(),
            store.assay_names()
        );
        Ok(store)
    }
}

/// Rebuild a deserialized table through `set_column` so column lengths are checked.
fn validated(table: MetadataTable) -> Result<MetadataTable> {
    let mut checked = MetadataTable::new(table.len());
    for (name, values) in table.columns() {
        checked.set_column(name, values.clone())?;
    }
    Ok(checked)
}
