//! Adapter layer for orchid-db.
//!
//! Maps `DbError` onto [`OrchidError`] so that indexing code can use `?` on
//! vector store calls.

use orchid_db::{DbError, DbResult};

use crate::errors::{IntoOrchidResult, OrchidError};

// ============================================================================
// Error Conversion
// ============================================================================

/// Convert an orchid-db error to an orchid-core error.
pub fn from_db_error(err: DbError) -> OrchidError {
    match err {
        DbError::Io(io_err) => OrchidError::Io(io_err),

        DbError::Json(json_err) => OrchidError::Json(json_err),

        DbError::VectorIo { path, message } => OrchidError::VectorIndexIo { path, message },

        DbError::VectorParse { path, message } => OrchidError::VectorIndexParse { path, message },

        DbError::DimensionMismatch { expected, actual } => OrchidError::VectorIndexIncompatible {
            reason: format!("Dimension mismatch: expected {}, got {}", expected, actual),
        },

        DbError::IndexNotFound { path } => OrchidError::VectorIndexIo {
            path,
            message: "Vector index not found".to_string(),
        },

        DbError::IndexIncompatible { path, reason } => OrchidError::VectorIndexIncompatible {
            reason: format!("{} ({})", reason, path.display()),
        },

        DbError::LanceDb { message } => OrchidError::VectorIndexBackendUnavailable {
            backend: "lancedb".to_string(),
            reason: message,
        },

        DbError::Internal { message } => OrchidError::VectorIndexBackendUnavailable {
            backend: "vector-store".to_string(),
            reason: message,
        },
    }
}

impl<T> IntoOrchidResult<T> for DbResult<T> {
    fn into_orchid_result(self) -> Result<T, OrchidError> {
        self.map_err(from_db_error)
    }
}
