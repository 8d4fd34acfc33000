use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("File not found at {}", .0.display())]
    DocumentNotFound(PathBuf),

    #[error("Failed to read document {}: {reason}", path.display())]
    DocumentAccess { path: PathBuf, reason: String },

    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("Graph format error at line {line}: {message}")]
    Format { line: usize, message: String },

    #[error("Relation extraction failed: {0}")]
    Extraction(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GraphError {
    pub(crate) fn format(line: usize, message: impl Into<String>) -> Self {
        Self::Format {
            line,
            message: message.into(),
        }
    }
}
