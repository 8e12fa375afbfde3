//! Core vector types and the backend trait every store implements.

use crate::error::DbResult;
use serde::{Deserialize, Serialize};

use super::metadata::VectorSearchFilter;

// ============================================================================
// VectorId
// ============================================================================

/// Identifier of a stored vector.
///
/// Snippet ids are random (see `orchid-core`'s indexer), so the only
/// requirement here is that they fit into LanceDB's `Int64` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VectorId(pub u64);

impl VectorId {
    pub fn new(id: u64) -> Self {
        VectorId(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// Value as stored in Arrow's signed column. Ids are masked to 63 bits
    /// on insert, so this never wraps.
    pub fn as_i64(&self) -> i64 {
        (self.0 & i64::MAX as u64) as i64
    }
}

impl From<u64> for VectorId {
    fn from(id: u64) -> Self {
        VectorId(id)
    }
}

impl From<i64> for VectorId {
    fn from(id: i64) -> Self {
        VectorId(id as u64)
    }
}

impl std::fmt::Display for VectorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// VectorMetric
// ============================================================================

/// Similarity metric of a collection. Snippet collections are always cosine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorMetric {
    #[default]
    Cosine,
    Dot,
    L2,
}

impl VectorMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            VectorMetric::Cosine => "cosine",
            VectorMetric::Dot => "dot",
            VectorMetric::L2 => "l2",
        }
    }
}

impl std::fmt::Display for VectorMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// VectorInsert / VectorSearchResult
// ============================================================================

/// A point to write into a collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorInsert {
    pub id: VectorId,
    pub vector: Vec<f32>,
    /// Opaque JSON stored next to the vector and handed back on search.
    pub payload: serde_json::Value,
    /// Source file the point was cut from. Used for prefix filtering.
    #[serde(default)]
    pub path: Option<String>,
}

impl VectorInsert {
    pub fn new(id: impl Into<VectorId>, vector: Vec<f32>, payload: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            vector,
            payload,
            path: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

/// One hit of a similarity query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorSearchResult {
    pub id: VectorId,
    /// Higher is better for every metric (L2 is reported negated).
    pub score: f32,
    pub payload: serde_json::Value,
}

impl VectorSearchResult {
    pub fn new(id: impl Into<VectorId>, score: f32, payload: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            score,
            payload,
        }
    }
}

// ============================================================================
// VectorIndexBackend
// ============================================================================

/// Storage backend for one collection.
///
/// Implementations use interior locking so a single `Arc<dyn VectorIndexBackend>`
/// can be shared. `query` returns hits best-first and `upsert` replaces points
/// whose id already exists.
pub trait VectorIndexBackend: Send + Sync {
    /// Nearest neighbours of `embedding`, at most `limit` of them.
    fn query(
        &self,
        embedding: &[f32],
        limit: usize,
        filter: Option<&VectorSearchFilter>,
    ) -> DbResult<Vec<VectorSearchResult>>;

    fn upsert(&self, vectors: &[VectorInsert]) -> DbResult<()>;

    fn delete(&self, ids: &[VectorId]) -> DbResult<()>;

    /// Persist buffered writes and refresh `index.meta.json`.
    fn flush(&self) -> DbResult<()>;

    fn len(&self) -> DbResult<usize>;

    fn is_empty(&self) -> DbResult<bool> {
        Ok(self.len()? == 0)
    }

    fn dimension(&self) -> usize;

    fn metric(&self) -> VectorMetric;

    /// Short backend name as written into the index metadata.
    fn backend_name(&self) -> &'static str;
}
