//! Prompt context: index freshness, retrieved snippets and user files.

use std::fs;
use std::io::ErrorKind;

use serde::Serialize;

use crate::indexer::Indexer;
use crate::interaction::Interaction;
use crate::scan::CodeChunk;
use crate::workspace::Workspace;

pub const STALE_INDEX_WARNING: &str =
    "Codebase has changed. Re-initialization recommended: `orchid init`.";

/// Index state observed when a session starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectContext {
    /// Hash of the source tree right now.
    pub hash: String,
    /// A collection exists for `hash`.
    pub collection_present: bool,
}

impl ProjectContext {
    pub fn is_stale(&self) -> bool {
        !self.collection_present
    }
}

/// Hash the project and check that its collection exists.
///
/// A missing collection only warns; search then finds nothing.
pub fn load_context(indexer: &Indexer, ui: &dyn Interaction) -> ProjectContext {
    let hash = indexer.current_hash();
    let collection_present = indexer.collection_exists(&hash);
    if !collection_present {
        tracing::info!("No collection for project hash {}", hash);
        ui.warn(STALE_INDEX_WARNING);
    }
    ProjectContext {
        hash,
        collection_present,
    }
}

fn wrap(path: &str, body: &str) -> String {
    format!(
        "--- START OF {path} ---\n{body}\n--- END OF {path} ---",
        path = path,
        body = body
    )
}

/// Retrieved snippets as one prompt block.
pub fn format_snippets(chunks: &[CodeChunk]) -> String {
    chunks
        .iter()
        .map(|c| wrap(&c.path, &c.code))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Read the files the user attached with `--file`.
///
/// Paths are relative to the project root. Missing files warn, other read
/// failures report an error; both are skipped.
pub fn load_user_files(workspace: &Workspace, paths: &[String], ui: &dyn Interaction) -> String {
    let mut out = String::new();
    for rel in paths {
        let full = match workspace.resolve_path(rel) {
            Ok(p) => p,
            Err(e) => {
                ui.error(&format!("Error reading file {}: {}", rel, e));
                continue;
            }
        };
        match fs::read_to_string(&full) {
            Ok(content) => {
                out.push_str(&wrap(rel, &content));
                out.push_str("\n\n");
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                ui.warn(&format!("File not found: {}", rel));
            }
            Err(e) => ui.error(&format!("Error reading file {}: {}", rel, e)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{test_config, FakeEmbedder, ScriptedInteraction};
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_format_snippets() {
        let text = format_snippets(&[
            CodeChunk::new("src/a.ts", "const a = 1;"),
            CodeChunk::new("src/b.ts", "const b = 2;"),
        ]);
        assert_eq!(
            text,
            "--- START OF src/a.ts ---\nconst a = 1;\n--- END OF src/a.ts ---\n\
             --- START OF src/b.ts ---\nconst b = 2;\n--- END OF src/b.ts ---"
        );
        assert_eq!(format_snippets(&[]), "");
    }

    #[test]
    fn test_load_user_files() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("src")).unwrap();
        fs::write(tmp.path().join("src/page.tsx"), "<main/>").unwrap();
        fs::create_dir(tmp.path().join("src/dir.ts")).unwrap();
        let ws = Workspace::from_root(tmp.path()).unwrap();
        let ui = ScriptedInteraction::new();

        let text = load_user_files(
            &ws,
            &[
                "src/page.tsx".into(),
                "src/missing.tsx".into(),
                "src/dir.ts".into(),
                "../escape.ts".into(),
            ],
            &ui,
        );

        assert_eq!(
            text,
            "--- START OF src/page.tsx ---\n<main/>\n--- END OF src/page.tsx ---\n\n"
        );
        assert!(ui.saw("File not found: src/missing.tsx"));
        assert!(ui.saw("Error reading file src/dir.ts"));
        assert!(ui.saw("Error reading file ../escape.ts"));
    }

    #[test]
    fn test_load_context_warns_when_stale() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("src")).unwrap();
        fs::write(tmp.path().join("src/a.ts"), "a").unwrap();
        let ws = Workspace::from_root(tmp.path()).unwrap();
        let indexer = Indexer::new(ws, test_config(), Arc::new(FakeEmbedder::default()));
        let ui = ScriptedInteraction::new();

        let ctx = load_context(&indexer, &ui);
        assert!(ctx.is_stale());
        assert!(ui.saw(STALE_INDEX_WARNING));

        indexer.initialize_project(&ui).unwrap();
        let ui = ScriptedInteraction::new();
        let ctx = load_context(&indexer, &ui);
        assert!(!ctx.is_stale());
        assert!(!ui.saw(STALE_INDEX_WARNING));
    }
}
