pub mod annotate;
pub mod common;
pub mod export;
pub mod import;
pub mod inspect;
pub mod subset;

pub use annotate::{run_annotate, AnnotateArgs};
pub use common::CommonArgs;
pub use export::{run_export, ExportArgs};
pub use import::{run_import, ImportArgs};
pub use inspect::{run_inspect, InspectArgs};
pub use subset::{run_subset, SubsetArgs};

/// File extension written by `import`, `annotate` and `subset`.
pub const STORE_EXTENSION: &str = "vxs";
