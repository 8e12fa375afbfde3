//! Collection configuration and the `index.meta.json` sidecar.

use super::traits::VectorMetric;
use crate::error::{DbError, DbResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

// ============================================================================
// Constants
// ============================================================================

/// Backend used when the configuration does not name one.
pub const DEFAULT_BACKEND: &str = "lancedb";

/// Metadata file written into every collection directory.
pub const INDEX_META_FILENAME: &str = "index.meta.json";

/// Table holding the snippets inside a LanceDB collection.
pub const LANCEDB_TABLE_NAME: &str = "vectors";

/// Bumped when the on-disk layout of a collection changes.
pub const SCHEMA_VERSION: u32 = 1;

// ============================================================================
// VectorIndexConfig
// ============================================================================

/// How to open (or create) one collection directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorIndexConfig {
    pub dimension: usize,
    pub path: PathBuf,
    #[serde(default = "default_backend")]
    pub backend: String,
    #[serde(default)]
    pub metric: VectorMetric,
    #[serde(default = "default_create_if_missing")]
    pub create_if_missing: bool,
}

fn default_backend() -> String {
    DEFAULT_BACKEND.to_string()
}

fn default_create_if_missing() -> bool {
    true
}

impl VectorIndexConfig {
    pub fn new(dimension: usize, path: impl Into<PathBuf>) -> Self {
        Self {
            dimension,
            path: path.into(),
            backend: DEFAULT_BACKEND.to_string(),
            metric: VectorMetric::Cosine,
            create_if_missing: true,
        }
    }

    pub fn with_backend(mut self, backend: impl Into<String>) -> Self {
        self.backend = backend.into();
        self
    }

    pub fn with_metric(mut self, metric: VectorMetric) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }
}

// ============================================================================
// VectorIndexMeta
// ============================================================================

/// Persisted description of a collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorIndexMeta {
    pub backend: String,
    pub dimension: usize,
    pub metric: VectorMetric,
    /// Point count at the last flush.
    #[serde(default)]
    pub count: usize,
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl VectorIndexMeta {
    pub fn new(backend: impl Into<String>, dimension: usize, metric: VectorMetric) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            backend: backend.into(),
            dimension,
            metric,
            count: 0,
            schema_version: SCHEMA_VERSION,
            created_at: Some(now.clone()),
            updated_at: Some(now),
        }
    }

    pub fn update_count(&mut self, count: usize) {
        self.count = count;
        self.updated_at = Some(chrono::Utc::now().to_rfc3339());
    }
}

// ============================================================================
// Compatibility
// ============================================================================

/// Outcome of comparing a config against what is on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VectorIndexCompatibility {
    Compatible,
    NotFound,
    IncompatibleDimension { expected: usize, actual: usize },
    IncompatibleBackend { expected: String, actual: String },
    IncompatibleMetric {
        expected: VectorMetric,
        actual: VectorMetric,
    },
    /// Directory has data but the metadata is missing or unreadable.
    Corrupted(String),
}

impl VectorIndexCompatibility {
    pub fn is_compatible(&self) -> bool {
        matches!(self, VectorIndexCompatibility::Compatible)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, VectorIndexCompatibility::NotFound)
    }
}

/// Compare `config` with the collection stored at `config.path`.
pub fn check_index_compatibility(config: &VectorIndexConfig) -> VectorIndexCompatibility {
    let meta_path = config.path.join(INDEX_META_FILENAME);

    if !meta_path.exists() {
        if config.path.is_dir() {
            let entries = config.path.read_dir().map(|rd| rd.count()).unwrap_or(0);
            if entries == 0 {
                return VectorIndexCompatibility::NotFound;
            }
            return VectorIndexCompatibility::Corrupted(
                "collection directory has data but no metadata".to_string(),
            );
        }
        return VectorIndexCompatibility::NotFound;
    }

    let meta = match load_index_meta(&config.path) {
        Ok(meta) => meta,
        Err(e) => return VectorIndexCompatibility::Corrupted(e.to_string()),
    };

    if meta.dimension != config.dimension {
        VectorIndexCompatibility::IncompatibleDimension {
            expected: config.dimension,
            actual: meta.dimension,
        }
    } else if meta.backend != config.backend {
        VectorIndexCompatibility::IncompatibleBackend {
            expected: config.backend.clone(),
            actual: meta.backend,
        }
    } else if meta.metric != config.metric {
        VectorIndexCompatibility::IncompatibleMetric {
            expected: config.metric,
            actual: meta.metric,
        }
    } else {
        VectorIndexCompatibility::Compatible
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// True when `path` holds a collection (its metadata file exists).
pub fn index_exists(path: &Path) -> bool {
    path.join(INDEX_META_FILENAME).is_file()
}

/// Delete the collection at `path`. Missing directories are not an error.
pub fn remove_index(path: &Path) -> DbResult<()> {
    if path.exists() {
        debug!("Removing collection at {:?}", path);
        fs::remove_dir_all(path).map_err(|e| DbError::vector_io(path, e.to_string()))?;
    }
    Ok(())
}

pub fn load_index_meta(path: &Path) -> DbResult<VectorIndexMeta> {
    let meta_path = path.join(INDEX_META_FILENAME);
    debug!("Loading index metadata from {:?}", meta_path);

    let content = fs::read_to_string(&meta_path).map_err(|e| {
        DbError::vector_io(&meta_path, format!("Failed to read index metadata: {}", e))
    })?;

    serde_json::from_str(&content).map_err(|e| {
        DbError::vector_parse(&meta_path, format!("Failed to parse index metadata: {}", e))
    })
}

pub fn write_index_meta(path: &Path, meta: &VectorIndexMeta) -> DbResult<()> {
    let meta_path = path.join(INDEX_META_FILENAME);
    debug!("Writing index metadata to {:?}", meta_path);

    fs::create_dir_all(path)?;
    fs::write(&meta_path, serde_json::to_string_pretty(meta)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_collection_is_not_found() {
        let dir = TempDir::new().unwrap();
        let config = VectorIndexConfig::new(8, dir.path().join("abc123"));
        assert!(check_index_compatibility(&config).is_not_found());
        assert!(!index_exists(&config.path));
    }

    #[test]
    fn test_dimension_mismatch_detected() {
        let dir = TempDir::new().unwrap();
        let meta = VectorIndexMeta::new("simple", 4, VectorMetric::Cosine);
        write_index_meta(dir.path(), &meta).unwrap();

        let config = VectorIndexConfig::new(8, dir.path()).with_backend("simple");
        assert_eq!(
            check_index_compatibility(&config),
            VectorIndexCompatibility::IncompatibleDimension {
                expected: 8,
                actual: 4
            }
        );
        assert!(index_exists(dir.path()));
    }

    #[test]
    fn test_stray_files_without_meta_are_corrupted() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("vectors.jsonl"), "{}").unwrap();
        let config = VectorIndexConfig::new(8, dir.path());
        assert!(matches!(
            check_index_compatibility(&config),
            VectorIndexCompatibility::Corrupted(_)
        ));
    }

    #[test]
    fn test_remove_index_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("collection");
        write_index_meta(&target, &VectorIndexMeta::new("simple", 2, VectorMetric::Cosine))
            .unwrap();

        remove_index(&target).unwrap();
        assert!(!target.exists());
        remove_index(&target).unwrap();
    }
}
