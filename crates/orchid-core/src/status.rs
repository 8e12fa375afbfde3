//! Status reporting for an Orchid project.
//!
//! Status never needs the models: it hashes the source tree and reads the
//! collection metadata straight from disk.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use orchid_db::vector::{index_exists, load_index_meta};
use serde::Serialize;

use crate::config::GlobalConfig;
use crate::scan::{discover_source_files, project_hash};
use crate::workspace::Workspace;

// ============================================================================
// StatusReport
// ============================================================================

/// Snapshot of a project's index state.
///
/// `collection_present` is false when the sources changed since the last
/// `orchid init`; the index fields are then `None`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    /// Absolute path to the project root.
    pub root: PathBuf,

    pub src_dir: PathBuf,

    pub db_dir: PathBuf,

    /// The db dir exists.
    pub initialized: bool,

    /// Source files matched by the configured extensions.
    pub files: usize,

    /// Hash of the source tree as it is now.
    pub current_hash: String,

    /// A collection exists for `current_hash`.
    pub collection_present: bool,

    /// Snippets stored in the current collection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indexed_count: Option<usize>,

    /// Vector backend that wrote the current collection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,

    /// Last time the current collection was written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indexed_at: Option<DateTime<Utc>>,

    /// `GEMINI_API_KEY` is usable.
    pub api_key_set: bool,
}

impl StatusReport {
    /// Gather status for `workspace` under `config`.
    pub fn collect(workspace: &Workspace, config: &GlobalConfig, api_key_set: bool) -> Self {
        let src_dir = workspace.src_dir(config);
        let db_dir = workspace.db_dir(config);
        let files = discover_source_files(&src_dir, &config.normalized_extensions());
        let current_hash = project_hash(workspace.root(), &files);

        let collection = db_dir.join(&current_hash);
        let collection_present = index_exists(&collection);
        let meta = if collection_present {
            load_index_meta(&collection)
                .map_err(|e| tracing::debug!("No readable metadata at {}: {}", collection.display(), e))
                .ok()
        } else {
            None
        };

        let indexed_at = meta
            .as_ref()
            .and_then(|m| m.updated_at.as_deref().or(m.created_at.as_deref()))
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            .map(|ts| ts.with_timezone(&Utc));

        Self {
            root: workspace.root().to_path_buf(),
            initialized: db_dir.is_dir(),
            src_dir,
            db_dir,
            files: files.len(),
            current_hash,
            collection_present,
            indexed_count: meta.as_ref().map(|m| m.count),
            backend: meta.map(|m| m.backend),
            indexed_at,
            api_key_set,
        }
    }

    /// Initialized and indexed for the current sources.
    pub fn is_ready(&self) -> bool {
        self.initialized && self.collection_present
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::Indexer;
    use crate::test_support::{test_config, FakeEmbedder, ScriptedInteraction};
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn project() -> (TempDir, Workspace) {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("src")).unwrap();
        fs::write(tmp.path().join("src/page.tsx"), "export default function Page() {}").unwrap();
        fs::write(tmp.path().join("src/notes.md"), "# ignored").unwrap();
        let ws = Workspace::from_root(tmp.path()).unwrap();
        (tmp, ws)
    }

    #[test]
    fn test_uninitialized_project() {
        let (_tmp, ws) = project();
        let report = StatusReport::collect(&ws, &test_config(), false);
        assert!(!report.initialized);
        assert!(!report.collection_present);
        assert_eq!(report.files, 1);
        assert_eq!(report.indexed_count, None);
        assert!(!report.is_ready());
    }

    #[test]
    fn test_status_after_init_then_edit() {
        let (tmp, ws) = project();
        let config = test_config();
        let indexer = Indexer::new(ws.clone(), config.clone(), Arc::new(FakeEmbedder::default()));
        indexer.initialize_project(&ScriptedInteraction::new()).unwrap();

        let report = StatusReport::collect(&ws, &config, true);
        assert!(report.is_ready());
        assert_eq!(report.indexed_count, Some(1));
        assert_eq!(report.backend.as_deref(), Some("simple"));
        assert!(report.indexed_at.is_some());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["apiKeySet"], true);
        assert_eq!(json["indexedCount"], 1);

        std::thread::sleep(std::time::Duration::from_millis(20));
        fs::write(tmp.path().join("src/extra.ts"), "export {}").unwrap();
        let report = StatusReport::collect(&ws, &config, true);
        assert!(report.initialized);
        assert!(!report.collection_present);
        assert_eq!(report.files, 2);
        assert!(serde_json::to_value(&report).unwrap().get("indexedCount").is_none());
    }
}
