//! JSONL-backed collection with brute-force scoring.
//!
//! Every write rewrites `vectors.jsonl`; fine for the few thousand snippets a
//! front-end project produces, and it keeps tests free of LanceDB.

use super::super::config::{load_index_meta, write_index_meta, VectorIndexConfig};
use super::super::metadata::VectorSearchFilter;
use super::super::traits::{
    VectorId, VectorIndexBackend, VectorInsert, VectorMetric, VectorSearchResult,
};
use crate::error::{DbError, DbResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, trace, warn};

const DATA_FILENAME: &str = "vectors.jsonl";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredVector {
    id: u64,
    vector: Vec<f32>,
    payload: serde_json::Value,
    #[serde(default)]
    path: Option<String>,
}

impl From<&VectorInsert> for StoredVector {
    fn from(insert: &VectorInsert) -> Self {
        Self {
            id: insert.id.value(),
            vector: insert.vector.clone(),
            payload: insert.payload.clone(),
            path: insert.path.clone(),
        }
    }
}

pub struct SimpleFileVectorIndex {
    path: PathBuf,
    dimension: usize,
    metric: VectorMetric,
    vectors: RwLock<HashMap<u64, StoredVector>>,
}

impl SimpleFileVectorIndex {
    pub fn open(config: &VectorIndexConfig) -> DbResult<Self> {
        debug!("Opening SimpleFileVectorIndex at {:?}", config.path);

        let index = Self {
            path: config.path.clone(),
            dimension: config.dimension,
            metric: config.metric,
            vectors: RwLock::new(HashMap::new()),
        };

        let data_path = config.path.join(DATA_FILENAME);
        if data_path.exists() {
            index.load_from_file(&data_path)?;
        }

        Ok(index)
    }

    fn load_from_file(&self, path: &Path) -> DbResult<()> {
        let reader = BufReader::new(File::open(path)?);
        let mut vectors = self
            .vectors
            .write()
            .map_err(|e| DbError::internal(format!("Failed to acquire write lock: {}", e)))?;

        for (line_num, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<StoredVector>(&line) {
                Ok(stored) => {
                    vectors.insert(stored.id, stored);
                }
                Err(e) => warn!("Skipping invalid line {} in {:?}: {}", line_num + 1, path, e),
            }
        }

        debug!("Loaded {} vectors", vectors.len());
        Ok(())
    }

    fn save_to_file(&self) -> DbResult<()> {
        let data_path = self.path.join(DATA_FILENAME);
        let vectors = self
            .vectors
            .read()
            .map_err(|e| DbError::internal(format!("Failed to acquire read lock: {}", e)))?;

        let mut writer = BufWriter::new(File::create(&data_path)?);
        for stored in vectors.values() {
            serde_json::to_writer(&mut writer, stored)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;

        debug!("Saved {} vectors to {:?}", vectors.len(), data_path);
        Ok(())
    }

    fn score(&self, a: &[f32], b: &[f32]) -> f32 {
        match self.metric {
            VectorMetric::Cosine => cosine_similarity(a, b),
            VectorMetric::Dot => dot_product(a, b),
            VectorMetric::L2 => -euclidean_distance(a, b),
        }
    }

    fn check_dimension(&self, len: usize) -> DbResult<()> {
        if len != self.dimension {
            return Err(DbError::DimensionMismatch {
                expected: self.dimension,
                actual: len,
            });
        }
        Ok(())
    }
}

impl VectorIndexBackend for SimpleFileVectorIndex {
    fn query(
        &self,
        embedding: &[f32],
        limit: usize,
        filter: Option<&VectorSearchFilter>,
    ) -> DbResult<Vec<VectorSearchResult>> {
        self.check_dimension(embedding.len())?;
        trace!("Querying SimpleFileVectorIndex, limit={}", limit);

        let vectors = self
            .vectors
            .read()
            .map_err(|e| DbError::internal(format!("Failed to acquire read lock: {}", e)))?;

        let mut scored: Vec<(f32, &StoredVector)> = vectors
            .values()
            .filter(|v| filter.map_or(true, |f| f.matches(v.path.as_deref())))
            .map(|v| (self.score(embedding, &v.vector), v))
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        Ok(scored
            .into_iter()
            .take(limit)
            .map(|(score, stored)| {
                VectorSearchResult::new(VectorId::new(stored.id), score, stored.payload.clone())
            })
            .collect())
    }

    fn upsert(&self, vectors: &[VectorInsert]) -> DbResult<()> {
        debug!("Upserting {} vectors", vectors.len());
        {
            let mut stored = self
                .vectors
                .write()
                .map_err(|e| DbError::internal(format!("Failed to acquire write lock: {}", e)))?;

            for insert in vectors {
                self.check_dimension(insert.vector.len())?;
                let entry = StoredVector::from(insert);
                stored.insert(entry.id, entry);
            }
        }
        self.save_to_file()
    }

    fn delete(&self, ids: &[VectorId]) -> DbResult<()> {
        {
            let mut stored = self
                .vectors
                .write()
                .map_err(|e| DbError::internal(format!("Failed to acquire write lock: {}", e)))?;
            for id in ids {
                stored.remove(&id.value());
            }
        }
        self.save_to_file()
    }

    fn flush(&self) -> DbResult<()> {
        self.save_to_file()?;
        let mut meta = load_index_meta(&self.path)?;
        meta.update_count(self.len()?);
        write_index_meta(&self.path, &meta)
    }

    fn len(&self) -> DbResult<usize> {
        let stored = self
            .vectors
            .read()
            .map_err(|e| DbError::internal(format!("Failed to acquire read lock: {}", e)))?;
        Ok(stored.len())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn metric(&self) -> VectorMetric {
        self.metric
    }

    fn backend_name(&self) -> &'static str {
        "simple"
    }
}

// ============================================================================
// Similarity Functions
// ============================================================================

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot = dot_product(a, b);
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f32>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::{index_exists, load_index_meta, open_vector_index};
    use tempfile::TempDir;

    fn snippet(id: u64, vector: Vec<f32>, path: &str) -> VectorInsert {
        VectorInsert::new(id, vector, serde_json::json!({"path": path, "code": "..."}))
            .with_path(path)
    }

    #[test]
    fn test_similarity_functions() {
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert!((dot_product(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]) - 32.0).abs() < 1e-6);
        assert!((euclidean_distance(&[0.0, 0.0], &[3.0, 4.0]) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_query_orders_best_first_and_persists() {
        let dir = TempDir::new().unwrap();
        let config = VectorIndexConfig::new(2, dir.path().join("hash")).with_backend("simple");
        let index = open_vector_index(&config).unwrap();

        index
            .upsert(&[
                snippet(1, vec![1.0, 0.0], "src/a.ts"),
                snippet(2, vec![0.0, 1.0], "src/b.ts"),
                snippet(3, vec![0.7, 0.7], "src/app/c.tsx"),
            ])
            .unwrap();
        index.flush().unwrap();

        let hits = index.query(&[1.0, 0.1], 2, None).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id.value(), 1);
        assert_eq!(hits[1].id.value(), 3);

        assert!(index_exists(&config.path));
        assert_eq!(load_index_meta(&config.path).unwrap().count, 3);

        let reopened = open_vector_index(&config).unwrap();
        assert_eq!(reopened.len().unwrap(), 3);
        assert_eq!(reopened.backend_name(), "simple");
    }

    #[test]
    fn test_filter_and_delete() {
        let dir = TempDir::new().unwrap();
        let config = VectorIndexConfig::new(2, dir.path().join("hash")).with_backend("simple");
        let index = SimpleFileVectorIndex::open(&config).unwrap();
        std::fs::create_dir_all(&config.path).unwrap();

        index
            .upsert(&[
                snippet(1, vec![1.0, 0.0], "src/a.ts"),
                snippet(2, vec![1.0, 0.0], "src/app/page.tsx"),
            ])
            .unwrap();

        let filter = VectorSearchFilter::new().with_path_prefix("src/app/");
        let hits = index.query(&[1.0, 0.0], 10, Some(&filter)).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].payload["path"], "src/app/page.tsx");

        index.delete(&[VectorId::new(2)]).unwrap();
        assert_eq!(index.len().unwrap(), 1);
    }

    #[test]
    fn test_wrong_dimension_rejected() {
        let dir = TempDir::new().unwrap();
        let config = VectorIndexConfig::new(3, dir.path()).with_backend("simple");
        let index = SimpleFileVectorIndex::open(&config).unwrap();

        let err = index
            .upsert(&[snippet(1, vec![1.0, 0.0], "src/a.ts")])
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
        assert!(index.query(&[1.0], 1, None).is_err());
    }
}
