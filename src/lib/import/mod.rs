//! Import adapters feeding a [`MatrixStore`](crate::store::MatrixStore).
//!
//! - [`vcf`]: variant calls → axes, genotype/depth assays and locus columns
//! - [`sample_table`]: delimited sample annotations aligned to the sample axis

pub mod sample_table;
pub mod vcf;

pub use sample_table::{read_sample_table, SampleTable};
pub use vcf::{import_variant_file, ImportOptions, ImportedVariants};
