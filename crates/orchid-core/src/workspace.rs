//! Workspace detection and path handling.
//!
//! A [`Workspace`] is the project root Orchid operates on. Every path Orchid
//! reads or writes on behalf of the model goes through
//! [`Workspace::resolve_path`], which keeps it inside the root.

use std::path::{Component, Path, PathBuf};

use crate::config::GlobalConfig;
use crate::constants::{ENV_FILENAME, PACKAGE_JSON_FILENAME};
use crate::errors::OrchidError;

/// Files or directories whose presence marks a project root.
const ROOT_MARKERS: &[&str] = &[PACKAGE_JSON_FILENAME, ".git"];

/// Check if a path is a disk root (`/` on Unix, `C:\` on Windows).
fn is_disk_root(path: &Path) -> bool {
    path.parent().is_none()
}

// ============================================================================
// Workspace
// ============================================================================

/// A resolved project directory.
///
/// ```ignore
/// let workspace = Workspace::resolve(&std::env::current_dir()?)?;
/// let src = workspace.src_dir(&config);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Use `root` as the project root without searching.
    ///
    /// # Errors
    ///
    /// Returns [`OrchidError::PathNotFound`] if `root` is not an existing directory.
    pub fn from_root(root: &Path) -> Result<Self, OrchidError> {
        let root = root
            .canonicalize()
            .map_err(|_| OrchidError::PathNotFound(root.display().to_string()))?;
        if !root.is_dir() {
            return Err(OrchidError::PathNotFound(root.display().to_string()));
        }
        Ok(Self { root })
    }

    /// Walk up from `start` to the nearest directory holding `package.json`
    /// or `.git`. Falls back to `start` itself when none is found before the
    /// disk root.
    pub fn resolve(start: &Path) -> Result<Self, OrchidError> {
        let start = start
            .canonicalize()
            .map_err(|_| OrchidError::PathNotFound(start.display().to_string()))?;

        let mut current = start.as_path();
        loop {
            if ROOT_MARKERS.iter().any(|m| current.join(m).exists()) {
                tracing::debug!("Resolved project root {}", current.display());
                return Self::from_root(current);
            }
            match current.parent() {
                Some(parent) if !is_disk_root(parent) => current = parent,
                _ => break,
            }
        }

        tracing::debug!(
            "No package.json or .git above {}, using it as the root",
            start.display()
        );
        Self::from_root(&start)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn src_dir(&self, config: &GlobalConfig) -> PathBuf {
        self.root.join(&config.src_dir)
    }

    /// Directory holding the vector collections.
    pub fn db_dir(&self, config: &GlobalConfig) -> PathBuf {
        self.root.join(&config.db_dir)
    }

    pub fn package_json(&self) -> PathBuf {
        self.root.join(PACKAGE_JSON_FILENAME)
    }

    pub fn env_file(&self) -> PathBuf {
        self.root.join(ENV_FILENAME)
    }

    /// `orchid init` has created the vector store directory.
    pub fn is_initialized(&self, config: &GlobalConfig) -> bool {
        self.db_dir(config).is_dir()
    }

    /// Join a project-relative path onto the root.
    ///
    /// Leading `./` is accepted; `.` components are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`OrchidError::PathOutsideProject`] for absolute paths, for
    /// paths whose `..` components climb above the root, and for paths that
    /// leave the root through a symlink.
    pub fn resolve_path(&self, relative: &str) -> Result<PathBuf, OrchidError> {
        let outside = || OrchidError::PathOutsideProject {
            path: relative.to_string(),
        };

        let mut normalized = PathBuf::new();
        let mut depth = 0usize;
        for component in Path::new(relative).components() {
            match component {
                Component::Normal(part) => {
                    normalized.push(part);
                    depth += 1;
                }
                Component::CurDir => {}
                Component::ParentDir => {
                    if depth == 0 {
                        return Err(outside());
                    }
                    normalized.pop();
                    depth -= 1;
                }
                Component::RootDir | Component::Prefix(_) => return Err(outside()),
            }
        }

        if depth == 0 {
            return Err(outside());
        }

        let joined = self.root.join(normalized);
        let anchor = joined
            .ancestors()
            .find(|p| p.symlink_metadata().is_ok())
            .unwrap_or(&self.root);
        match anchor.canonicalize() {
            Ok(real) if real.starts_with(&self.root) => Ok(joined),
            Ok(real) => {
                tracing::warn!("{} resolves outside the project to {}", relative, real.display());
                Err(outside())
            }
            // Dangling symlink
            Err(_) => Err(outside()),
        }
    }
}
