//! Source discovery, project hashing and chunking.
//!
//! The project hash covers file paths and modification times only, so it
//! changes whenever a source file is added, removed or touched. A collection
//! is keyed by that hash; any change means the whole index is rebuilt.

use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use ignore::WalkBuilder;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::constants::should_ignore_dir;

// ============================================================================
// CodeChunk
// ============================================================================

/// A slice of one source file; also the payload stored with its vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeChunk {
    /// Project-relative path with `/` separators.
    pub path: String,
    pub code: String,
}

impl CodeChunk {
    pub fn new(path: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            code: code.into(),
        }
    }
}

// ============================================================================
// Discovery
// ============================================================================

/// All files under `src_dir` whose extension is in `extensions`, sorted.
///
/// `.gitignore` and hidden-file rules are not applied; only directories named
/// in [`crate::constants::ALWAYS_IGNORED_DIRS`] are pruned. A missing
/// `src_dir` yields an empty list.
pub fn discover_source_files(src_dir: &Path, extensions: &[String]) -> Vec<PathBuf> {
    if !src_dir.is_dir() {
        tracing::debug!("Source directory {} does not exist", src_dir.display());
        return Vec::new();
    }

    let walker = WalkBuilder::new(src_dir)
        .standard_filters(false)
        .follow_links(false)
        .filter_entry(|entry| {
            let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
            !(is_dir && should_ignore_dir(&entry.file_name().to_string_lossy()))
        })
        .build();

    let mut files = Vec::new();
    for result in walker {
        let entry = match result {
            Ok(e) => e,
            Err(e) => {
                tracing::debug!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let matches = entry
            .path()
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .is_some_and(|ext| extensions.iter().any(|e| *e == ext));
        if matches {
            files.push(entry.into_path());
        }
    }

    files.sort();
    files
}

/// `path` relative to `root`, with `/` separators. Paths outside `root` are
/// returned unchanged.
pub fn relative_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

// ============================================================================
// Project hash
// ============================================================================

/// SHA-256 over each file's project-relative path followed by its mtime,
/// in sorted path order. Files whose metadata cannot be read are skipped.
pub fn project_hash(root: &Path, files: &[PathBuf]) -> String {
    let mut sorted: Vec<&PathBuf> = files.iter().collect();
    sorted.sort();

    let mut hasher = Sha256::new();
    for path in sorted {
        let Some(mtime) = modified_secs(path) else {
            tracing::debug!("Skipping {} in project hash", path.display());
            continue;
        };
        hasher.update(relative_path(root, path).as_bytes());
        hasher.update(format_mtime(mtime).as_bytes());
    }

    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

fn modified_secs(path: &Path) -> Option<f64> {
    let modified = path.metadata().ok()?.modified().ok()?;
    let since_epoch = modified.duration_since(UNIX_EPOCH).ok()?;
    Some(since_epoch.as_secs_f64())
}

/// Decimal seconds, always with a fractional part (`12.0`, `12.5`).
fn format_mtime(secs: f64) -> String {
    let text = secs.to_string();
    if text.contains('.') {
        text
    } else {
        format!("{}.0", text)
    }
}

// ============================================================================
// Chunking
// ============================================================================

/// Split `content` into consecutive slices of at most `size` characters.
///
/// Slices end on `char` boundaries. Empty content or a zero size gives no
/// slices.
pub fn chunk_text(content: &str, size: usize) -> Vec<&str> {
    if size == 0 {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut start = 0;
    let mut count = 0;
    for (idx, _) in content.char_indices() {
        if count == size {
            chunks.push(&content[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }
    if start < content.len() {
        chunks.push(&content[start..]);
    }
    chunks
}

/// Chunk one file's content into payloads tagged with `path`.
pub fn chunk_file(path: &str, content: &str, size: usize) -> Vec<CodeChunk> {
    chunk_text(content, size)
        .into_iter()
        .map(|code| CodeChunk::new(path, code))
        .collect()
}
