//! Error types for mesh import

use meshscope_core::Error;
use thiserror::Error;

/// Errors that can occur while decoding a mesh file
#[derive(Error, Debug)]
pub enum IoError {
    #[error("Unsupported mesh format: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("Parse error at line {line}: {message}")]
    ParseError { line: usize, message: String },

    #[error("Truncated {format} data: {message}")]
    Truncated { format: &'static str, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<IoError> for Error {
    fn from(error: IoError) -> Self {
        match error {
            IoError::UnsupportedFormat { extension } => Error::UnsupportedFormat(extension),
            IoError::Io(e) => Error::Io(e),
            other => Error::InvalidData(other.to_string()),
        }
    }
}
