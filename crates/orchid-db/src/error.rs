//! Error types for orchid-db.

use std::path::PathBuf;
use thiserror::Error;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    // ========================================================================
    // Collection errors
    // ========================================================================
    #[error("Vector index I/O error at {path}: {message}")]
    VectorIo { path: PathBuf, message: String },

    #[error("Vector index parse error at {path}: {message}")]
    VectorParse { path: PathBuf, message: String },

    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Vector index not found at {path}")]
    IndexNotFound { path: PathBuf },

    /// The stored collection cannot be opened with the requested settings.
    #[error("Vector index at {path} is incompatible: {reason}")]
    IndexIncompatible { path: PathBuf, reason: String },

    #[error("LanceDB error: {message}")]
    LanceDb { message: String },

    // ========================================================================
    // General errors
    // ========================================================================
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DbError {
    pub fn vector_io(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::VectorIo {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn vector_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::VectorParse {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn index_incompatible(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::IndexIncompatible {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn lance(message: impl Into<String>) -> Self {
        Self::LanceDb {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

#[cfg(feature = "lancedb")]
impl From<lancedb::Error> for DbError {
    fn from(err: lancedb::Error) -> Self {
        Self::LanceDb {
            message: err.to_string(),
        }
    }
}
