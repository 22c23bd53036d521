//! varexp: synchronized annotated matrix store for variant calls
//!
//! A store keeps feature (locus) and sample axes, one metadata table per axis
//! and any number of feature × sample assays aligned to both. The library
//! provides:
//! 1. The store itself, with coordinated subsetting by mask, position or identifier
//! 2. VCF/BCF import into genotype and depth assays plus locus annotations
//! 3. Sample annotation ingestion with identity alignment checks
//! 4. Binary persistence and tab-delimited export
//!
//! # Modules
//!
//! - [`core`]: errors, I/O helpers, sparse kernels and thread-pool setup
//! - [`store`]: axes, metadata tables, assays and the [`store::MatrixStore`]
//! - [`import`]: variant file and sample table adapters
//! - [`export`]: TSV writers for metadata and assays

pub mod core;
pub mod export;
pub mod import;
pub mod store;

pub mod prelude {
    pub use crate::core::error::{Result, VarexpError};
    pub use crate::import::{
        import_variant_file, read_sample_table, ImportOptions, ImportedVariants, SampleTable,
    };
    pub use crate::store::{
        mask_to_positions, positions_to_mask, Assay, Axis, ColumnValues, MatrixStore,
        MetadataTable, Selector, StoreSummary,
    };
}
