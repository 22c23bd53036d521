//! Error types for the varexp library

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VarexpError {
    #[error("Duplicate identifier: {0}")]
    DuplicateIdentifier(String),

    #[error("Identifier not found: {0}")]
    NotFound(String),

    #[error("Metadata column not found: {0}")]
    ColumnNotFound(String),

    #[error("Assay not found: {0}")]
    AssayNotFound(String),

    #[error("Length mismatch for {context}: expected {expected}, got {actual}")]
    LengthMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },

    #[error("Shape mismatch for {context}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        context: String,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("Index {index} out of range for axis of length {length}")]
    IndexOutOfRange { index: usize, length: usize },

    #[error("Alignment error: {0}")]
    Alignment(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("htslib error: {0}")]
    Htslib(#[from] rust_htslib::errors::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("Sparse matrix error: {0}")]
    SparseMatrix(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unrecognised store format: {0}")]
    Format(String),

    #[error("Empty data: {0}")]
    EmptyData(String),
}

pub type Result<T> = std::result::Result<T, VarexpError>;

impl From<nalgebra_sparse::SparseFormatError> for VarexpError {
    fn from(err: nalgebra_sparse::SparseFormatError) -> Self {
        VarexpError::SparseMatrix(format!("Sparse format error: {:?}", err))
    }
}

impl VarexpError {
    /// Shorthand for a [`VarexpError::LengthMismatch`].
    pub fn length_mismatch(context: impl Into<String>, expected: usize, actual: usize) -> Self {
        VarexpError::LengthMismatch {
            context: context.into(),
            expected,
            actual,
        }
    }
}
