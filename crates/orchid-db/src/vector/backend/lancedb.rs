//! LanceDB collection backend.
//!
//! One table (`vectors`) per collection directory. LanceDB is async; the
//! backend owns a Tokio runtime and blocks on every call so the rest of the
//! workspace can stay synchronous.

use super::super::config::{
    load_index_meta, write_index_meta, VectorIndexConfig, LANCEDB_TABLE_NAME,
};
use super::super::metadata::VectorSearchFilter;
use super::super::traits::{
    VectorId, VectorIndexBackend, VectorInsert, VectorMetric, VectorSearchResult,
};
use crate::error::{DbError, DbResult};
use arrow_array::{
    Array, ArrayRef, FixedSizeListArray, Float32Array, Int64Array, RecordBatch,
    RecordBatchIterator, StringArray,
};
use arrow_schema::{DataType, Field, Schema};
use futures::TryStreamExt;
use lance_arrow::FixedSizeListArrayExt;
use lancedb::{
    connect,
    query::{ExecutableQuery, QueryBase},
    Connection, DistanceType, Table,
};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use tokio::runtime::Runtime;
use tracing::{debug, trace};

pub struct LanceDbVectorIndex {
    path: PathBuf,
    dimension: usize,
    metric: VectorMetric,
    connection: Connection,
    /// Opened (or created) on first use.
    table: RwLock<Option<Table>>,
    runtime: Runtime,
}

impl LanceDbVectorIndex {
    pub fn open(config: &VectorIndexConfig) -> DbResult<Self> {
        debug!("Opening LanceDbVectorIndex at {:?}", config.path);

        let runtime = Runtime::new()
            .map_err(|e| DbError::internal(format!("Failed to create runtime: {}", e)))?;

        let uri = config.path.to_string_lossy().to_string();
        let connection = runtime
            .block_on(async { connect(&uri).execute().await })
            .map_err(|e| DbError::lance(format!("Failed to connect: {}", e)))?;

        let index = Self {
            path: config.path.clone(),
            dimension: config.dimension,
            metric: config.metric,
            connection,
            table: RwLock::new(None),
            runtime,
        };
        index.ensure_table()?;
        Ok(index)
    }

    fn ensure_table(&self) -> DbResult<()> {
        let mut guard = self
            .table
            .write()
            .map_err(|e| DbError::internal(format!("Failed to acquire table lock: {}", e)))?;
        if guard.is_some() {
            return Ok(());
        }

        let names = self
            .runtime
            .block_on(async { self.connection.table_names().execute().await })
            .map_err(|e| DbError::lance(format!("Failed to list tables: {}", e)))?;

        let table = if names.iter().any(|n| n == LANCEDB_TABLE_NAME) {
            debug!("Opening existing table '{}'", LANCEDB_TABLE_NAME);
            self.runtime
                .block_on(async {
                    self.connection
                        .open_table(LANCEDB_TABLE_NAME)
                        .execute()
                        .await
                })
                .map_err(|e| DbError::lance(format!("Failed to open table: {}", e)))?
        } else {
            debug!("Creating table '{}'", LANCEDB_TABLE_NAME);
            let batch = self.to_batch(&[])?;
            let schema = batch.schema();
            let batches = RecordBatchIterator::new(vec![Ok(batch)], schema);
            self.runtime
                .block_on(async {
                    self.connection
                        .create_table(LANCEDB_TABLE_NAME, Box::new(batches))
                        .execute()
                        .await
                })
                .map_err(|e| DbError::lance(format!("Failed to create table: {}", e)))?
        };

        *guard = Some(table);
        Ok(())
    }

    fn table(&self) -> DbResult<Table> {
        self.ensure_table()?;
        let guard = self
            .table
            .read()
            .map_err(|e| DbError::internal(format!("Failed to acquire table lock: {}", e)))?;
        guard
            .clone()
            .ok_or_else(|| DbError::internal("Table not initialized"))
    }

    fn schema(&self) -> Schema {
        Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new(
                "vector",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, true)),
                    self.dimension as i32,
                ),
                false,
            ),
            Field::new("path", DataType::Utf8, true),
            Field::new("payload", DataType::Utf8, true),
        ])
    }

    fn to_batch(&self, inserts: &[VectorInsert]) -> DbResult<RecordBatch> {
        let ids: ArrayRef = Arc::new(Int64Array::from(
            inserts.iter().map(|i| i.id.as_i64()).collect::<Vec<_>>(),
        ));

        let flat: Vec<f32> = inserts
            .iter()
            .flat_map(|i| i.vector.iter().copied())
            .collect();
        let vectors: ArrayRef = Arc::new(
            FixedSizeListArray::try_new_from_values(Float32Array::from(flat), self.dimension as i32)
                .map_err(|e| DbError::internal(format!("Failed to build vector column: {}", e)))?,
        );

        let paths: ArrayRef = Arc::new(StringArray::from(
            inserts.iter().map(|i| i.path.as_deref()).collect::<Vec<_>>(),
        ));
        let payloads: ArrayRef = Arc::new(StringArray::from(
            inserts
                .iter()
                .map(|i| serde_json::to_string(&i.payload).ok())
                .collect::<Vec<_>>(),
        ));

        RecordBatch::try_new(Arc::new(self.schema()), vec![ids, vectors, paths, payloads])
            .map_err(|e| DbError::internal(format!("Failed to create batch: {}", e)))
    }

    fn distance_type(&self) -> DistanceType {
        match self.metric {
            VectorMetric::Cosine => DistanceType::Cosine,
            VectorMetric::Dot => DistanceType::Dot,
            VectorMetric::L2 => DistanceType::L2,
        }
    }

    /// LanceDB reports distances; callers expect higher-is-better scores.
    fn score_from_distance(&self, distance: f32) -> f32 {
        match self.metric {
            VectorMetric::Cosine | VectorMetric::Dot => 1.0 - distance,
            VectorMetric::L2 => -distance,
        }
    }

    fn id_filter(ids: impl Iterator<Item = VectorId>) -> String {
        let list = ids
            .map(|id| id.as_i64().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        format!("id IN ({})", list)
    }
}

impl VectorIndexBackend for LanceDbVectorIndex {
    fn query(
        &self,
        embedding: &[f32],
        limit: usize,
        filter: Option<&VectorSearchFilter>,
    ) -> DbResult<Vec<VectorSearchResult>> {
        if embedding.len() != self.dimension {
            return Err(DbError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.len(),
            });
        }
        trace!("Querying LanceDbVectorIndex, limit={}", limit);

        let table = self.table()?;
        let batches: Vec<RecordBatch> = self.runtime.block_on(async {
            let mut query = table
                .vector_search(embedding.to_vec())
                .map_err(|e| DbError::lance(format!("Failed to create query: {}", e)))?;

            if let Some(where_clause) = filter.and_then(|f| f.to_lance_filter()) {
                debug!("Applying filter: {}", where_clause);
                query = query.only_if(where_clause);
            }

            query
                .limit(limit)
                .distance_type(self.distance_type())
                .execute()
                .await
                .map_err(|e| DbError::lance(format!("Query failed: {}", e)))?
                .try_collect()
                .await
                .map_err(|e| DbError::lance(format!("Failed to collect results: {}", e)))
        })?;

        let mut hits = Vec::new();
        for batch in batches {
            let ids = batch
                .column_by_name("id")
                .and_then(|c| c.as_any().downcast_ref::<Int64Array>());
            let payloads = batch
                .column_by_name("payload")
                .and_then(|c| c.as_any().downcast_ref::<StringArray>());
            let distances = batch
                .column_by_name("_distance")
                .and_then(|c| c.as_any().downcast_ref::<Float32Array>());

            let (Some(ids), Some(payloads), Some(distances)) = (ids, payloads, distances) else {
                return Err(DbError::lance("Query result is missing expected columns"));
            };

            for row in 0..batch.num_rows() {
                let payload = if payloads.is_null(row) {
                    serde_json::Value::Null
                } else {
                    serde_json::from_str(payloads.value(row))?
                };
                hits.push(VectorSearchResult::new(
                    VectorId::from(ids.value(row)),
                    self.score_from_distance(distances.value(row)),
                    payload,
                ));
            }
        }

        Ok(hits)
    }

    fn upsert(&self, vectors: &[VectorInsert]) -> DbResult<()> {
        if vectors.is_empty() {
            return Ok(());
        }
        if let Some(bad) = vectors.iter().find(|v| v.vector.len() != self.dimension) {
            return Err(DbError::DimensionMismatch {
                expected: self.dimension,
                actual: bad.vector.len(),
            });
        }
        debug!("Upserting {} vectors", vectors.len());

        let table = self.table()?;
        let replace = Self::id_filter(vectors.iter().map(|v| v.id));
        let batch = self.to_batch(vectors)?;
        let schema = batch.schema();

        self.runtime.block_on(async {
            if let Err(e) = table.delete(&replace).await {
                debug!("Delete before upsert failed (ignored): {}", e);
            }
            table
                .add(Box::new(RecordBatchIterator::new(vec![Ok(batch)], schema)))
                .execute()
                .await
                .map_err(|e| DbError::lance(format!("Insert failed: {}", e)))?;
            Ok(())
        })
    }

    fn delete(&self, ids: &[VectorId]) -> DbResult<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let table = self.table()?;
        let predicate = Self::id_filter(ids.iter().copied());
        self.runtime.block_on(async {
            table
                .delete(&predicate)
                .await
                .map_err(|e| DbError::lance(format!("Delete failed: {}", e)))?;
            Ok(())
        })
    }

    fn flush(&self) -> DbResult<()> {
        // Table writes are durable on return; only the sidecar needs refreshing.
        let mut meta = load_index_meta(&self.path)?;
        meta.update_count(self.len()?);
        write_index_meta(&self.path, &meta)
    }

    fn len(&self) -> DbResult<usize> {
        let table = self.table()?;
        self.runtime.block_on(async {
            table
                .count_rows(None)
                .await
                .map_err(|e| DbError::lance(format!("Count failed: {}", e)))
        })
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn metric(&self) -> VectorMetric {
        self.metric
    }

    fn backend_name(&self) -> &'static str {
        "lancedb"
    }
}

#[cfg(all(test, feature = "lancedb"))]
mod tests {
    use super::*;
    use crate::vector::{index_exists, load_index_meta, open_vector_index};
    use tempfile::TempDir;

    fn snippet(id: u64, vector: Vec<f32>, path: &str) -> VectorInsert {
        VectorInsert::new(id, vector, serde_json::json!({"path": path, "code": "..."}))
            .with_path(path)
    }

    #[test]
    fn test_id_filter_uses_signed_ids() {
        let filter = LanceDbVectorIndex::id_filter([VectorId::new(1), VectorId::new(u64::MAX)].into_iter());
        assert_eq!(filter, format!("id IN (1, {})", i64::MAX));
    }

    #[test]
    fn test_query_orders_best_first_and_persists() {
        let dir = TempDir::new().unwrap();
        let config = VectorIndexConfig::new(2, dir.path().join("hash"));
        let index = open_vector_index(&config).unwrap();
        assert_eq!(index.backend_name(), "lancedb");
        assert!(index.is_empty().unwrap());

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
        assert!(hits[0].score >= hits[1].score);
        assert_eq!(hits[0].payload["path"], "src/a.ts");

        assert!(index_exists(&config.path));
        assert_eq!(load_index_meta(&config.path).unwrap().count, 3);

        drop(index);
        let reopened = open_vector_index(&config).unwrap();
        assert_eq!(reopened.len().unwrap(), 3);
    }

    #[test]
    fn test_upsert_replaces_same_id() {
        let dir = TempDir::new().unwrap();
        let config = VectorIndexConfig::new(2, dir.path().join("hash"));
        let index = open_vector_index(&config).unwrap();

        index.upsert(&[snippet(7, vec![1.0, 0.0], "src/old.ts")]).unwrap();
        index.upsert(&[snippet(7, vec![0.0, 1.0], "src/new.ts")]).unwrap();

        assert_eq!(index.len().unwrap(), 1);
        let hits = index.query(&[0.0, 1.0], 5, None).unwrap();
        assert_eq!(hits[0].payload["path"], "src/new.ts");
    }

    #[test]
    fn test_filter_and_delete() {
        let dir = TempDir::new().unwrap();
        let config = VectorIndexConfig::new(2, dir.path().join("hash"));
        let index = open_vector_index(&config).unwrap();

        index
            .upsert(&[
                snippet(1, vec![1.0, 0.0], "src/a.ts"),
                snippet(2, vec![1.0, 0.0], "src/app/page.tsx"),
                snippet(3, vec![1.0, 0.0], "src/my_app/page.tsx"),
                snippet(4, vec![1.0, 0.0], "src/myXapp/page.tsx"),
            ])
            .unwrap();

        let filter = VectorSearchFilter::new().with_path_prefix("src/app/");
        let hits = index.query(&[1.0, 0.0], 10, Some(&filter)).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].payload["path"], "src/app/page.tsx");

        let filter = VectorSearchFilter::new().with_path_prefix("src/my_app/");
        let hits = index.query(&[1.0, 0.0], 10, Some(&filter)).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id.value(), 3);

        index.delete(&[VectorId::new(2)]).unwrap();
        assert_eq!(index.len().unwrap(), 3);
    }

    #[test]
    fn test_wrong_dimension_rejected() {
        let dir = TempDir::new().unwrap();
        let config = VectorIndexConfig::new(3, dir.path().join("hash"));
        let index = open_vector_index(&config).unwrap();

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
