//! Configuration types for orchid-model.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Public Generative Language API root.
pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Embedding model used for snippets and queries.
pub const DEFAULT_EMBEDDING_MODEL: &str = "models/text-embedding-004";

/// Generation requests can take minutes for large plans.
pub const DEFAULT_TIMEOUT_SECS: u64 = 180;

/// Largest batch `batchEmbedContents` accepts.
pub const MAX_EMBED_BATCH: usize = 100;

// ============================================================================
// EmbeddingTask
// ============================================================================

/// Task type hint sent with every embedding request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmbeddingTask {
    /// Code snippets being stored.
    RetrievalDocument,
    /// A user query searched against stored snippets.
    RetrievalQuery,
}

impl EmbeddingTask {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RetrievalDocument => "RETRIEVAL_DOCUMENT",
            Self::RetrievalQuery => "RETRIEVAL_QUERY",
        }
    }
}

impl std::fmt::Display for EmbeddingTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EmbeddingTask {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().replace('-', "_").as_str() {
            "RETRIEVAL_DOCUMENT" | "DOCUMENT" => Ok(Self::RetrievalDocument),
            "RETRIEVAL_QUERY" | "QUERY" => Ok(Self::RetrievalQuery),
            _ => Err(format!(
                "Unknown embedding task: '{}'. Use 'retrieval_document' or 'retrieval_query'.",
                s
            )),
        }
    }
}

// ============================================================================
// GeminiConfig
// ============================================================================

/// Connection settings shared by the embedding and generation clients.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiConfig {
    /// Never serialised; comes from the environment.
    #[serde(skip)]
    pub api_key: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_embedding_model() -> String {
    DEFAULT_EMBEDDING_MODEL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("embedding_model", &self.embedding_model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: default_base_url(),
            embedding_model: default_embedding_model(),
            timeout_secs: default_timeout_secs(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = model.into();
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn validate(&self) -> ModelResult<()> {
        if self.api_key.trim().is_empty() {
            return Err(ModelError::invalid_config("API key is empty"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ModelError::invalid_config(format!(
                "base URL must start with http:// or https://, got '{}'",
                self.base_url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(ModelError::invalid_config("timeout must be at least 1 second"));
        }
        Ok(())
    }

    /// `{base}/{model}:{method}` with the `models/` prefix added when missing.
    pub fn endpoint(&self, model: &str, method: &str) -> String {
        format!(
            "{}/{}:{}",
            self.base_url.trim_end_matches('/'),
            qualified_model(model),
            method
        )
    }
}

/// `gemini-2.5-pro` → `models/gemini-2.5-pro`; already-qualified names pass through.
pub fn qualified_model(model: &str) -> String {
    if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{}", model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_building() {
        let config = GeminiConfig::new("k").with_base_url("http://localhost:9999/v1beta/");
        assert_eq!(
            config.endpoint("gemini-2.5-pro", "generateContent"),
            "http://localhost:9999/v1beta/models/gemini-2.5-pro:generateContent"
        );
        assert_eq!(
            config.endpoint("models/text-embedding-004", "batchEmbedContents"),
            "http://localhost:9999/v1beta/models/text-embedding-004:batchEmbedContents"
        );
    }

    #[test]
    fn test_validate() {
        assert!(GeminiConfig::new("key").validate().is_ok());
        assert!(GeminiConfig::new("  ").validate().is_err());
        assert!(GeminiConfig::new("key")
            .with_base_url("ftp://x")
            .validate()
            .is_err());
        assert!(GeminiConfig::new("key")
            .with_timeout_secs(0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_debug_redacts_key() {
        let rendered = format!("{:?}", GeminiConfig::new("secret-key"));
        assert!(!rendered.contains("secret-key"));
    }

    #[test]
    fn test_task_names() {
        assert_eq!(EmbeddingTask::RetrievalQuery.to_string(), "RETRIEVAL_QUERY");
        assert_eq!(
            "retrieval-document".parse::<EmbeddingTask>().unwrap(),
            EmbeddingTask::RetrievalDocument
        );
        assert!("classify".parse::<EmbeddingTask>().is_err());
    }
}
