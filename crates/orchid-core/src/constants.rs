//! Common constants used throughout orchid-core.
//!
//! Paths, directory names and defaults shared by the config, scanning and
//! database-setup code live here.

// ============================================================================
// Directory Names
// ============================================================================

/// The name of the global Orchid configuration directory (`~/.orchid/`).
pub const ORCHID_HOME_DIR: &str = ".orchid";

/// Default source directory, relative to the project root.
pub const DEFAULT_SRC_DIR: &str = "src";

/// Default vector store directory, relative to the project root.
pub const DEFAULT_DB_DIR: &str = "orchid_db";

// ============================================================================
// Ignored Directories
// ============================================================================

/// Directories skipped at any depth while discovering source files.
///
/// - `node_modules` - installed packages
/// - `.next` - Next.js build output
pub const ALWAYS_IGNORED_DIRS: &[&str] = &["node_modules", ".next"];

#[inline]
pub fn should_ignore_dir(name: &str) -> bool {
    ALWAYS_IGNORED_DIRS.contains(&name)
}

// ============================================================================
// Source Files
// ============================================================================

/// File extensions indexed by default.
pub const DEFAULT_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx"];

/// Characters per code chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Snippets retrieved per query.
pub const DEFAULT_SEARCH_LIMIT: usize = 15;

// ============================================================================
// Project Files
// ============================================================================

pub const PACKAGE_JSON_FILENAME: &str = "package.json";

pub const ENV_FILENAME: &str = ".env";

/// The name of the global configuration file.
pub const GLOBAL_CONFIG_FILENAME: &str = "config.yaml";

// ============================================================================
// Environment
// ============================================================================

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Value shipped in sample `.env` files; treated as unset.
pub const API_KEY_PLACEHOLDER: &str = "YOUR_API_KEY_HERE";

/// Overrides the global config path.
pub const CONFIG_PATH_ENV: &str = "ORCHID_CONFIG";

/// Key written to `.env` by database setup.
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

/// Header placed above values appended to `.env`.
pub const ENV_BLOCK_HEADER: &str = "# Added by Orchid AI Agent";

// ============================================================================
// Package Manager
// ============================================================================

pub const DEFAULT_INSTALL_COMMAND: &str = "npm install --legacy-peer-deps";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_ignore_dir() {
        assert!(should_ignore_dir("node_modules"));
        assert!(should_ignore_dir(".next"));
        assert!(!should_ignore_dir("src"));
        assert!(!should_ignore_dir(".git"));
    }
}
