//! Synchronized annotated matrix store.
//!
//! A [`MatrixStore`] owns one feature [`Axis`], one sample [`Axis`], a
//! [`MetadataTable`] per axis and a set of named [`Assay`]s, each shaped
//! `(features, samples)`. Subsetting slices all of them with the same
//! position lists, so assay cells can never drift from their row or column
//! annotations.
//!
//! - [`axis`]: identifier ↔ position index for one dimension
//! - [`metadata`]: typed per-axis annotation columns and mask helpers
//! - [`assay`]: CSR-backed feature × sample arrays
//! - [`selector`]: `All | Mask | Positions | Identifiers` axis selection
//! - [`matrix_store`]: the container and its coordinated `subset`
//! - [`persist`]: save/load as a compressed binary blob

pub mod assay;
pub mod axis;
pub mod matrix_store;
pub mod metadata;
pub mod persist;
pub mod selector;

pub use assay::Assay;
pub use axis::Axis;
pub use matrix_store::{MatrixStore, StoreSummary};
pub use metadata::{mask_to_positions, positions_to_mask, ColumnValues, MetadataTable};
pub use selector::Selector;
