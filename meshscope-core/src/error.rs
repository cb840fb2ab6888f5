//! Error types for meshscope

use thiserror::Error;

/// Main error type for meshscope operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Invalid model: {0}")]
    InvalidModel(String),

    #[error("Degenerate camera: {0}")]
    DegenerateCamera(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Point request abandoned before a vertex was picked")]
    PointRequestAbandoned,

    #[error("Algorithm error: {0}")]
    Algorithm(String),
}

/// Result type alias for meshscope operations
pub type Result<T> = std::result::Result<T, Error>;
