//! Backend dispatch for snippet collections.
//!
//! - `lancedb` (default): LanceDB table with ANN search
//! - `simple`: JSONL file with brute-force scoring, handy for tests and tiny projects

#[cfg(feature = "lancedb")]
mod lancedb;

#[cfg(feature = "simple")]
mod simple;

#[cfg(feature = "lancedb")]
pub use self::lancedb::LanceDbVectorIndex;

#[cfg(feature = "simple")]
pub use simple::SimpleFileVectorIndex;

use super::config::{
    check_index_compatibility, write_index_meta, VectorIndexCompatibility, VectorIndexConfig,
    VectorIndexMeta,
};
use super::traits::VectorIndexBackend;
use crate::error::{DbError, DbResult};
use std::sync::Arc;
use tracing::{debug, info};

/// Open the collection described by `config`, creating it when allowed.
///
/// # Errors
///
/// - `IndexNotFound` when the collection is missing and `create_if_missing` is off
/// - `DimensionMismatch` / `IndexIncompatible` when the stored metadata disagrees
/// - `Internal` for a backend that is unknown or compiled out
pub fn open_vector_index(config: &VectorIndexConfig) -> DbResult<Arc<dyn VectorIndexBackend>> {
    debug!("Opening collection at {:?}", config.path);

    match check_index_compatibility(config) {
        VectorIndexCompatibility::Compatible => {}
        VectorIndexCompatibility::NotFound if config.create_if_missing => {
            info!("Creating collection at {:?}", config.path);
            let meta = VectorIndexMeta::new(&config.backend, config.dimension, config.metric);
            write_index_meta(&config.path, &meta)?;
        }
        VectorIndexCompatibility::NotFound => {
            return Err(DbError::IndexNotFound {
                path: config.path.clone(),
            });
        }
        VectorIndexCompatibility::IncompatibleDimension { expected, actual } => {
            return Err(DbError::DimensionMismatch { expected, actual });
        }
        VectorIndexCompatibility::IncompatibleBackend { expected, actual } => {
            return Err(DbError::index_incompatible(
                &config.path,
                format!("backend mismatch: expected '{}', found '{}'", expected, actual),
            ));
        }
        VectorIndexCompatibility::IncompatibleMetric { expected, actual } => {
            return Err(DbError::index_incompatible(
                &config.path,
                format!("metric mismatch: expected '{}', found '{}'", expected, actual),
            ));
        }
        VectorIndexCompatibility::Corrupted(msg) => {
            return Err(DbError::index_incompatible(&config.path, msg));
        }
    }

    match config.backend.as_str() {
        #[cfg(feature = "lancedb")]
        "lancedb" => Ok(Arc::new(LanceDbVectorIndex::open(config)?)),

        #[cfg(feature = "simple")]
        "simple" => Ok(Arc::new(SimpleFileVectorIndex::open(config)?)),

        backend => Err(DbError::internal(format!(
            "Unknown or disabled vector backend '{}'. Available backends: {}",
            backend,
            available_backends().join(", ")
        ))),
    }
}

/// Backends compiled into this build.
#[allow(clippy::vec_init_then_push)]
pub fn available_backends() -> Vec<&'static str> {
    let mut backends = Vec::new();

    #[cfg(feature = "lancedb")]
    backends.push("lancedb");

    #[cfg(feature = "simple")]
    backends.push("simple");

    backends
}
