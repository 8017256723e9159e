//! Error types for tinspline

use thiserror::Error;

/// Main error type for tinspline operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Not enough points: {required} required, {found} usable")]
    InsufficientPoints { required: usize, found: usize },

    #[error("Triangulation failed: {0}")]
    Triangulation(String),

    #[error("Singular linear system of size {size}")]
    SingularSystem { size: usize },

    #[error("Parse error at line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("{0}")]
    Other(String),
}

/// Result type alias for tinspline operations
pub type Result<T> = std::result::Result<T, Error>;
