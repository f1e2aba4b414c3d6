//! Error types shared by the codecs and tools.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for mesh operations
pub type Result<T> = std::result::Result<T, MeshError>;

/// Errors raised while reading, writing or transforming poly data.
#[derive(Debug, Error)]
pub enum MeshError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("format error: {0}")]
    Format(String),
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),
    #[error("unsupported data type: {0}")]
    UnsupportedType(String),
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error("input and output are the same file: {0}")]
    SamePath(PathBuf),
}

impl MeshError {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        MeshError::Parse {
            line,
            message: message.into(),
        }
    }

    /// Short category name used in CLI diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            MeshError::Io(_) => "IoError",
            MeshError::Parse { .. } | MeshError::Format(_) => "ParseError",
            MeshError::UnsupportedFormat(_) | MeshError::UnsupportedType(_) => "UnsupportedError",
            MeshError::InvalidData(_) => "DataError",
            MeshError::SamePath(_) => "InputError",
        }
    }
}
