pub mod concurrency;
pub mod error;
pub mod errors;
pub mod fs;
pub mod io;
pub mod sparse;

pub mod prelude {
    pub use super::concurrency::{configure_global_thread_pool, determine_allowed_cpus};
    pub use super::error::{Result, VarexpError};
    pub use super::errors::is_broken_pipe;
    pub use super::fs::is_gzipped;
    pub use super::io::{finish_writer, get_reader, get_writer};
    pub use super::sparse::SparseOps;
}
