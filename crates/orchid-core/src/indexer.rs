//! Snippet indexing and semantic search.
//!
//! One collection exists per project hash, at `<db_dir>/<hash>`. Indexing is
//! all-or-nothing: the collection is dropped and rebuilt from every chunk,
//! and collections for older hashes are removed afterwards.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use orchid_db::vector::{
    index_exists, load_index_meta, open_vector_index, remove_index, VectorId, VectorIndexConfig,
    VectorInsert, VectorMetric,
};
use orchid_model::{EmbeddingModel, EmbeddingTask, MAX_EMBED_BATCH};
use serde::Serialize;

use crate::config::GlobalConfig;
use crate::errors::{IntoOrchidResult, OrchidError, OrchidResult};
use crate::interaction::{stage, Interaction};
use crate::scan::{chunk_file, discover_source_files, project_hash, relative_path, CodeChunk};
use crate::workspace::Workspace;

/// Points written per upsert call.
const UPSERT_BATCH: usize = 256;

// ============================================================================
// InitReport
// ============================================================================

/// Summary of one `orchid init` run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitReport {
    /// Source files discovered.
    pub files: usize,
    /// Chunks produced from the readable files.
    pub chunks: usize,
    /// Chunks stored in the collection.
    pub indexed: usize,
    /// Files that could not be read as UTF-8 text.
    pub skipped_files: usize,
    pub hash: String,
    pub collection_path: PathBuf,
    /// Collections for older hashes that were deleted.
    pub removed_collections: usize,
}

// ============================================================================
// Indexer
// ============================================================================

#[derive(Clone)]
pub struct Indexer {
    workspace: Workspace,
    config: GlobalConfig,
    embedder: Arc<dyn EmbeddingModel>,
}

impl std::fmt::Debug for Indexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Indexer")
            .field("root", &self.workspace.root())
            .field("embedder", &self.embedder.model_id())
            .finish()
    }
}

impl Indexer {
    pub fn new(workspace: Workspace, config: GlobalConfig, embedder: Arc<dyn EmbeddingModel>) -> Self {
        Self {
            workspace,
            config,
            embedder,
        }
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn db_dir(&self) -> PathBuf {
        self.workspace.db_dir(&self.config)
    }

    pub fn collection_path(&self, hash: &str) -> PathBuf {
        self.db_dir().join(hash)
    }

    pub fn collection_exists(&self, hash: &str) -> bool {
        index_exists(&self.collection_path(hash))
    }

    /// Source files under the configured src dir.
    pub fn source_files(&self) -> Vec<PathBuf> {
        discover_source_files(
            &self.workspace.src_dir(&self.config),
            &self.config.normalized_extensions(),
        )
    }

    /// Hash of the project as it is on disk now.
    pub fn current_hash(&self) -> String {
        project_hash(self.workspace.root(), &self.source_files())
    }

    /// Points stored in the collection for `hash`, from its metadata.
    pub fn indexed_count(&self, hash: &str) -> Option<usize> {
        load_index_meta(&self.collection_path(hash))
            .ok()
            .map(|meta| meta.count)
    }

    // ------------------------------------------------------------------
    // Indexing
    // ------------------------------------------------------------------

    /// Embed `chunks` and store them as the collection for `hash`, replacing
    /// whatever was there. Returns the number of stored snippets.
    pub fn build_collection(
        &self,
        hash: &str,
        chunks: &[CodeChunk],
        ui: &dyn Interaction,
    ) -> OrchidResult<usize> {
        if chunks.is_empty() {
            ui.warn("No code snippets found to index");
            return Ok(0);
        }

        let total = chunks.len();
        ui.progress(stage::EMBEDDING, 0, total);
        let mut embeddings: Vec<Vec<f32>> = Vec::with_capacity(total);
        for batch in chunks.chunks(MAX_EMBED_BATCH) {
            let texts: Vec<&str> = batch.iter().map(|c| c.code.as_str()).collect();
            let vectors = self
                .embedder
                .embed(&texts, EmbeddingTask::RetrievalDocument)
                .into_orchid_result()?;
            embeddings.extend(vectors);
            ui.progress(stage::EMBEDDING, embeddings.len(), total);
        }

        if embeddings.len() != total {
            return Err(OrchidError::EmbeddingFailed {
                model: self.embedder.model_id().to_string(),
                reason: format!("expected {} embeddings, got {}", total, embeddings.len()),
            });
        }

        let dimension = embeddings.first().map(|e| e.len()).unwrap_or(0);
        if dimension == 0 {
            return Err(OrchidError::EmbeddingFailed {
                model: self.embedder.model_id().to_string(),
                reason: "empty embedding vector".to_string(),
            });
        }

        let path = self.collection_path(hash);
        remove_index(&path).into_orchid_result()?;
        let index_config = VectorIndexConfig::new(dimension, &path)
            .with_backend(&self.config.vector_backend)
            .with_metric(VectorMetric::Cosine);
        let index = open_vector_index(&index_config).into_orchid_result()?;

        ui.progress(stage::STORING, 0, total);
        let mut stored = 0;
        let pairs: Vec<(&CodeChunk, Vec<f32>)> = chunks.iter().zip(embeddings).collect();
        for batch in pairs.chunks(UPSERT_BATCH) {
            let inserts = batch
                .iter()
                .map(|(chunk, vector)| {
                    let payload = serde_json::to_value(chunk)?;
                    Ok(VectorInsert::new(random_id(), vector.clone(), payload)
                        .with_path(chunk.path.clone()))
                })
                .collect::<Result<Vec<_>, serde_json::Error>>()?;
            index.upsert(&inserts).into_orchid_result()?;
            stored += inserts.len();
            ui.progress(stage::STORING, stored, total);
        }
        index.flush().into_orchid_result()?;

        tracing::info!("Indexed {} snippets into {}", stored, path.display());
        ui.success(&format!("Indexed {} snippets", stored));
        Ok(stored)
    }

    /// Scan, chunk and index the whole project.
    pub fn initialize_project(&self, ui: &dyn Interaction) -> OrchidResult<InitReport> {
        let db_dir = self.db_dir();
        fs::create_dir_all(&db_dir)?;

        ui.think("Analyzing project files...");
        let files = self.source_files();
        let hash = project_hash(self.workspace.root(), &files);
        tracing::debug!("Project hash {} over {} files", hash, files.len());

        let mut chunks = Vec::new();
        let mut skipped_files = 0;
        ui.progress(stage::ANALYZING_FILES, 0, files.len());
        for (i, file) in files.iter().enumerate() {
            let rel = relative_path(self.workspace.root(), file);
            match fs::read_to_string(file) {
                Ok(content) => chunks.extend(chunk_file(&rel, &content, self.config.chunk_size)),
                Err(e) => {
                    skipped_files += 1;
                    ui.error(&format!("Error reading file {}: {}", rel, e));
                }
            }
            ui.progress(stage::ANALYZING_FILES, i + 1, files.len());
        }

        let indexed = self.build_collection(&hash, &chunks, ui)?;
        let removed_collections = self.remove_stale_collections(&hash)?;

        Ok(InitReport {
            files: files.len(),
            chunks: chunks.len(),
            indexed,
            skipped_files,
            collection_path: self.collection_path(&hash),
            hash,
            removed_collections,
        })
    }

    /// Delete collections under the db dir other than `keep`.
    fn remove_stale_collections(&self, keep: &str) -> OrchidResult<usize> {
        let db_dir = self.db_dir();
        let Ok(entries) = fs::read_dir(&db_dir) else {
            return Ok(0);
        };

        let mut removed = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if entry.file_name().to_string_lossy() == keep || !is_collection(&path) {
                continue;
            }
            remove_index(&path).into_orchid_result()?;
            tracing::info!("Removed stale collection {}", path.display());
            removed += 1;
        }
        Ok(removed)
    }

    // ------------------------------------------------------------------
    // Search
    // ------------------------------------------------------------------

    /// Up to `k` snippets closest to `query`, best first.
    ///
    /// Never fails: problems are reported as a warning and give no results.
    pub fn search(&self, hash: &str, query: &str, k: usize, ui: &dyn Interaction) -> Vec<CodeChunk> {
        match self.try_search(hash, query, k) {
            Ok(chunks) => chunks,
            Err(e) => {
                tracing::debug!("Search failed: {:?}", e);
                ui.warn(&format!("Code search failed: {}", e));
                Vec::new()
            }
        }
    }

    fn try_search(&self, hash: &str, query: &str, k: usize) -> OrchidResult<Vec<CodeChunk>> {
        let path = self.collection_path(hash);
        if !index_exists(&path) {
            return Err(OrchidError::VectorIndexIo {
                path,
                message: "no index for the current code; run `orchid init`".to_string(),
            });
        }

        let embedding = self
            .embedder
            .embed_one(query, EmbeddingTask::RetrievalQuery)
            .into_orchid_result()?;

        let index_config = VectorIndexConfig::new(embedding.len(), &path)
            .with_backend(&self.config.vector_backend)
            .with_create_if_missing(false);
        let index = open_vector_index(&index_config).into_orchid_result()?;

        let hits = index.query(&embedding, k, None).into_orchid_result()?;
        Ok(hits
            .into_iter()
            .filter_map(|hit| serde_json::from_value::<CodeChunk>(hit.payload).ok())
            .collect())
    }
}

fn is_collection(path: &Path) -> bool {
    path.is_dir() && index_exists(path)
}

fn random_id() -> VectorId {
    VectorId::new(uuid::Uuid::new_v4().as_u64_pair().0)
}
