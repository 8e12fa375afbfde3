//! Configuration types for Orchid.
//!
//! - [`GlobalConfig`]: user-level settings stored in `~/.orchid/config.yaml`
//! - [`ModelsConfig`]: which Gemini model serves which role
//!
//! The API key never lives in the YAML file. It is read from the process
//! environment after `.env` files have been loaded (see [`load_env_files`]).

use std::fs;
use std::path::{Path, PathBuf};

use orchid_model::{GeminiConfig, RetryPolicy, DEFAULT_API_BASE_URL, DEFAULT_EMBEDDING_MODEL};
use serde::{Deserialize, Serialize};

use crate::constants::{
    API_KEY_ENV, API_KEY_PLACEHOLDER, CONFIG_PATH_ENV, DEFAULT_CHUNK_SIZE, DEFAULT_DB_DIR,
    DEFAULT_EXTENSIONS, DEFAULT_INSTALL_COMMAND, DEFAULT_SEARCH_LIMIT, DEFAULT_SRC_DIR,
    ENV_FILENAME, GLOBAL_CONFIG_FILENAME, ORCHID_HOME_DIR,
};
use crate::errors::OrchidError;

/// Default chat model for plans and answers.
pub const DEFAULT_CHAT_MODEL: &str = "gemini-2.5-pro";

/// Default model for the question/build classifier.
pub const DEFAULT_CLASSIFIER_MODEL: &str = "gemini-2.5-flash-lite-preview-06-17";

/// Default model for the database classifier.
pub const DEFAULT_DATABASE_CLASSIFIER_MODEL: &str = "gemini-2.5-flash";

/// Upper bound above which `searchLimit` draws a warning.
const SEARCH_LIMIT_WARN_THRESHOLD: usize = 100;

// ============================================================================
// ModelsConfig
// ============================================================================

/// Model names per role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelsConfig {
    #[serde(default = "default_chat_model")]
    pub chat: String,

    #[serde(default = "default_classifier_model")]
    pub classifier: String,

    #[serde(default = "default_database_classifier_model")]
    pub database_classifier: String,

    #[serde(default = "default_embedding_model")]
    pub embedding: String,
}

fn default_chat_model() -> String {
    DEFAULT_CHAT_MODEL.to_string()
}

fn default_classifier_model() -> String {
    DEFAULT_CLASSIFIER_MODEL.to_string()
}

fn default_database_classifier_model() -> String {
    DEFAULT_DATABASE_CLASSIFIER_MODEL.to_string()
}

fn default_embedding_model() -> String {
    DEFAULT_EMBEDDING_MODEL.to_string()
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            chat: default_chat_model(),
            classifier: default_classifier_model(),
            database_classifier: default_database_classifier_model(),
            embedding: default_embedding_model(),
        }
    }
}

// ============================================================================
// GlobalConfig
// ============================================================================

/// Global (user-level) configuration for Orchid.
///
/// Every key is optional; a missing file or key falls back to the defaults.
///
/// # Example YAML
///
/// ```yaml
/// srcDir: app
/// chunkSize: 800
/// models:
///   chat: gemini-2.5-flash
/// retry:
///   maxRetries: 3
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalConfig {
    /// Directory scanned for source files, relative to the project root.
    #[serde(default = "default_src_dir")]
    pub src_dir: String,

    /// Directory holding vector collections, relative to the project root.
    #[serde(default = "default_db_dir")]
    pub db_dir: String,

    /// Extensions (without dot) of files to index.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Characters per indexed snippet.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Snippets retrieved per query.
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,

    /// Vector backend name (`lancedb` or `simple`).
    #[serde(default = "default_vector_backend")]
    pub vector_backend: String,

    #[serde(default)]
    pub models: ModelsConfig,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Backoff for rate-limited plan requests.
    #[serde(default)]
    pub retry: RetryPolicy,

    /// Command run with the plan's dependencies appended.
    #[serde(default = "default_install_command")]
    pub install_command: String,
}

fn default_src_dir() -> String {
    DEFAULT_SRC_DIR.to_string()
}

fn default_db_dir() -> String {
    DEFAULT_DB_DIR.to_string()
}

fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect()
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_search_limit() -> usize {
    DEFAULT_SEARCH_LIMIT
}

fn default_vector_backend() -> String {
    orchid_db::vector::DEFAULT_BACKEND.to_string()
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    orchid_model::DEFAULT_TIMEOUT_SECS
}

fn default_install_command() -> String {
    DEFAULT_INSTALL_COMMAND.to_string()
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            src_dir: default_src_dir(),
            db_dir: default_db_dir(),
            extensions: default_extensions(),
            chunk_size: default_chunk_size(),
            search_limit: default_search_limit(),
            vector_backend: default_vector_backend(),
            models: ModelsConfig::default(),
            api_base_url: default_api_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            retry: RetryPolicy::default(),
            install_command: default_install_command(),
        }
    }
}

impl GlobalConfig {
    /// Load from `explicit`, else `$ORCHID_CONFIG`, else `~/.orchid/config.yaml`.
    pub fn load(explicit: Option<&Path>) -> Result<Self, OrchidError> {
        if let Some(path) = explicit {
            return Self::from_path(path);
        }
        if let Some(path) = std::env::var_os(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
            return Self::from_path(Path::new(&path));
        }
        Self::load_default()
    }

    /// Load the global configuration from `~/.orchid/config.yaml`.
    pub fn load_default() -> Result<Self, OrchidError> {
        match Self::default_path() {
            Some(path) => Self::from_path(&path),
            None => {
                tracing::debug!("Could not determine home directory, using default config");
                Ok(Self::default())
            }
        }
    }

    /// Load the configuration from a specific path.
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`OrchidError::InvalidGlobalConfig`] if the file cannot be read
    /// or parsed, and [`OrchidError::InvalidConfiguration`] if validation fails.
    pub fn from_path(path: &Path) -> Result<Self, OrchidError> {
        if !path.exists() {
            tracing::debug!(
                "Global config not found at {}, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            OrchidError::InvalidGlobalConfig(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let config = Self::from_yaml(&content).map_err(|e| match e {
            OrchidError::Yaml(err) => OrchidError::InvalidGlobalConfig(format!(
                "Failed to parse {}: {}",
                path.display(),
                err
            )),
            other => other,
        })?;

        for warning in config.validate()? {
            tracing::warn!("{}", warning);
        }

        Ok(config)
    }

    /// Parse YAML text. An empty document yields the defaults.
    pub fn from_yaml(content: &str) -> Result<Self, OrchidError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn to_yaml(&self) -> Result<String, OrchidError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// `~/.orchid/config.yaml`, if a home directory exists.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(ORCHID_HOME_DIR).join(GLOBAL_CONFIG_FILENAME))
    }

    /// Check the configuration, returning non-fatal warnings.
    ///
    /// # Errors
    ///
    /// Returns [`OrchidError::InvalidConfiguration`] for values that would make
    /// indexing or requests impossible.
    pub fn validate(&self) -> Result<Vec<String>, OrchidError> {
        let mut warnings = Vec::new();

        if self.chunk_size == 0 {
            return Err(OrchidError::InvalidConfiguration {
                message: "chunkSize cannot be 0".to_string(),
                hint: format!("Set chunkSize to at least 1 (default: {})", DEFAULT_CHUNK_SIZE),
            });
        }

        if self.search_limit == 0 {
            return Err(OrchidError::InvalidConfiguration {
                message: "searchLimit cannot be 0".to_string(),
                hint: format!(
                    "Set searchLimit to at least 1 (default: {})",
                    DEFAULT_SEARCH_LIMIT
                ),
            });
        }

        if self.request_timeout_secs == 0 {
            return Err(OrchidError::InvalidConfiguration {
                message: "requestTimeoutSecs cannot be 0".to_string(),
                hint: "Set requestTimeoutSecs to at least 1 (default: 180)".to_string(),
            });
        }

        if self.retry.max_retries == 0 {
            return Err(OrchidError::InvalidConfiguration {
                message: "retry.maxRetries cannot be 0".to_string(),
                hint: "Set retry.maxRetries to at least 1 (default: 5)".to_string(),
            });
        }

        if self.search_limit > SEARCH_LIMIT_WARN_THRESHOLD {
            warnings.push(format!(
                "searchLimit={} is very large; prompts may exceed the model's context window",
                self.search_limit
            ));
        }

        if self.extensions.is_empty() {
            warnings.push("extensions is empty; `orchid init` will index nothing".to_string());
        }

        if !orchid_db::vector::available_backends().contains(&self.vector_backend.as_str()) {
            warnings.push(format!(
                "vectorBackend '{}' is not available in this build (available: {})",
                self.vector_backend,
                orchid_db::vector::available_backends().join(", ")
            ));
        }

        if self.install_command.trim().is_empty() {
            warnings.push(
                "installCommand is empty; plans that add dependencies will fail to install".to_string(),
            );
        }

        Ok(warnings)
    }

    /// Extensions normalised to lower case without a leading dot.
    pub fn normalized_extensions(&self) -> Vec<String> {
        self.extensions
            .iter()
            .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|e| !e.is_empty())
            .collect()
    }

    /// Client settings for the hosted models.
    pub fn gemini_config(&self, api_key: impl Into<String>) -> GeminiConfig {
        GeminiConfig::new(api_key)
            .with_base_url(&self.api_base_url)
            .with_embedding_model(&self.models.embedding)
            .with_timeout_secs(self.request_timeout_secs)
    }

    /// The Gemini API key from the process environment.
    pub fn api_key() -> Result<String, OrchidError> {
        api_key_from(std::env::var(API_KEY_ENV).ok())
    }
}

// ============================================================================
// Environment
// ============================================================================

/// Validate a raw `GEMINI_API_KEY` value.
///
/// Missing, blank and the sample placeholder are all treated as unset.
pub fn api_key_from(value: Option<String>) -> Result<String, OrchidError> {
    match value.map(|v| v.trim().to_string()) {
        Some(key) if !key.is_empty() && key != API_KEY_PLACEHOLDER => Ok(key),
        _ => Err(OrchidError::MissingApiKey),
    }
}

/// Load `.env` from the project root, then from the current directory.
///
/// Variables already set in the environment are never overwritten, so the
/// shell wins over the project file, which wins over the cwd file.
pub fn load_env_files(project_root: &Path) {
    let mut candidates = vec![project_root.join(ENV_FILENAME)];
    if let Ok(cwd) = std::env::current_dir() {
        let cwd_env = cwd.join(ENV_FILENAME);
        if !candidates.contains(&cwd_env) {
            candidates.push(cwd_env);
        }
    }

    for path in candidates {
        if !path.is_file() {
            continue;
        }
        match dotenv::from_path(&path) {
            Ok(()) => tracing::debug!("Loaded environment from {}", path.display()),
            Err(e) => tracing::warn!("Failed to load {}: {}", path.display(), e),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = GlobalConfig::default();
        assert_eq!(config.src_dir, "src");
        assert_eq!(config.db_dir, "orchid_db");
        assert_eq!(config.extensions, vec!["ts", "tsx", "js", "jsx"]);
        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.search_limit, 15);
        assert_eq!(config.models.chat, "gemini-2.5-pro");
        assert_eq!(config.models.classifier, "gemini-2.5-flash-lite-preview-06-17");
        assert_eq!(config.models.database_classifier, "gemini-2.5-flash");
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.install_command, "npm install --legacy-peer-deps");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
srcDir: app
chunkSize: 500
models:
  chat: gemini-2.5-flash
retry:
  maxRetries: 2
"#;
        let config = GlobalConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.src_dir, "app");
        assert_eq!(config.chunk_size, 500);
        assert_eq!(config.models.chat, "gemini-2.5-flash");
        assert_eq!(config.models.embedding, "models/text-embedding-004");
        assert_eq!(config.retry.max_retries, 2);
        assert_eq!(config.retry.base_wait_secs, 2);
        assert_eq!(config.db_dir, "orchid_db");
    }

    #[test]
    fn test_empty_yaml_is_default() {
        let config = GlobalConfig::from_yaml("  \n").unwrap();
        assert_eq!(config.search_limit, 15);
    }

    #[test]
    fn test_missing_file_is_default() {
        let tmp = TempDir::new().unwrap();
        let config = GlobalConfig::from_path(&tmp.path().join("nope.yaml")).unwrap();
        assert_eq!(config.chunk_size, 1000);
    }

    #[test]
    fn test_invalid_file_is_reported() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.yaml");
        fs::write(&path, "chunkSize: [not a number").unwrap();
        let err = GlobalConfig::from_path(&path).unwrap_err();
        assert!(matches!(err, OrchidError::InvalidGlobalConfig(_)));
    }

    #[test]
    fn test_zero_chunk_size_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.yaml");
        fs::write(&path, "chunkSize: 0\n").unwrap();
        let err = GlobalConfig::from_path(&path).unwrap_err();
        assert!(matches!(err, OrchidError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_validate_warnings() {
        let config = GlobalConfig {
            search_limit: 500,
            extensions: Vec::new(),
            vector_backend: "faiss".to_string(),
            ..GlobalConfig::default()
        };
        let warnings = config.validate().unwrap();
        assert!(warnings.iter().any(|w| w.contains("searchLimit=500")));
        assert!(warnings.iter().any(|w| w.contains("extensions is empty")));
        assert!(warnings.iter().any(|w| w.contains("faiss")));
    }

    #[test]
    fn test_empty_install_command_warns_about_failure() {
        let config = GlobalConfig {
            install_command: "  ".to_string(),
            ..GlobalConfig::default()
        };
        let warnings = config.validate().unwrap();
        assert!(warnings
            .iter()
            .any(|w| w.contains("installCommand is empty") && w.contains("fail")));
    }

    #[test]
    fn test_normalized_extensions() {
        let config = GlobalConfig {
            extensions: vec![".TS".into(), "tsx".into(), " ".into()],
            ..GlobalConfig::default()
        };
        assert_eq!(config.normalized_extensions(), vec!["ts", "tsx"]);
    }

    #[test]
    fn test_api_key_from() {
        assert_eq!(api_key_from(Some(" abc ".into())).unwrap(), "abc");
        assert!(matches!(api_key_from(None), Err(OrchidError::MissingApiKey)));
        assert!(matches!(
            api_key_from(Some(String::new())),
            Err(OrchidError::MissingApiKey)
        ));
        assert!(matches!(
            api_key_from(Some("YOUR_API_KEY_HERE".into())),
            Err(OrchidError::MissingApiKey)
        ));
    }

    #[test]
    fn test_gemini_config_carries_settings() {
        let config = GlobalConfig {
            api_base_url: "http://localhost:1234".into(),
            request_timeout_secs: 5,
            ..GlobalConfig::default()
        };
        let gemini = config.gemini_config("key");
        assert_eq!(gemini.base_url, "http://localhost:1234");
        assert_eq!(gemini.timeout_secs, 5);
        assert_eq!(gemini.embedding_model, "models/text-embedding-004");
    }

    #[test]
    fn test_yaml_round_trip_uses_camel_case() {
        let yaml = GlobalConfig::default().to_yaml().unwrap();
        assert!(yaml.contains("srcDir: src"));
        assert!(yaml.contains("databaseClassifier"));
    }
}
