//! # orchid-model
//!
//! Hosted model access for Orchid: Gemini embeddings and text generation.
//!
//! Both capabilities sit behind traits (`EmbeddingModel`, `ChatModel`) so
//! `orchid-core` can be tested with in-process fakes. This crate ships only
//! the real HTTP clients; test doubles live in the consuming crates.
//!
//! ```ignore
//! use orchid_model::{create_gemini_models, EmbeddingTask, GeminiConfig};
//!
//! let (embedder, chat) = create_gemini_models(GeminiConfig::new(api_key))?;
//! let vectors = embedder.embed(&["export const users = …"], EmbeddingTask::RetrievalDocument)?;
//! let text = chat.generate("gemini-2.5-pro", "Explain src/lib/db/schema.ts")?;
//! ```

pub mod config;
pub mod error;
pub mod retry;

mod embedding;
mod generation;
mod http;

use std::sync::Arc;

pub use config::{
    qualified_model, EmbeddingTask, GeminiConfig, DEFAULT_API_BASE_URL, DEFAULT_EMBEDDING_MODEL,
    DEFAULT_TIMEOUT_SECS, MAX_EMBED_BATCH,
};
pub use embedding::GeminiEmbeddingModel;
pub use error::{ModelError, ModelResult};
pub use generation::GeminiChatModel;
pub use retry::RetryPolicy;

// ============================================================================
// Traits
// ============================================================================

/// Dense text embeddings.
pub trait EmbeddingModel: Send + Sync + std::fmt::Debug {
    /// One vector per input, in input order.
    fn embed(&self, texts: &[&str], task: EmbeddingTask) -> ModelResult<Vec<Vec<f32>>>;

    fn embed_one(&self, text: &str, task: EmbeddingTask) -> ModelResult<Vec<f32>> {
        self.embed(&[text], task)?
            .into_iter()
            .next()
            .ok_or_else(|| ModelError::embedding_failed(self.model_id(), "empty embedding batch"))
    }

    fn model_id(&self) -> &str;
}

/// Single-prompt text generation.
pub trait ChatModel: Send + Sync + std::fmt::Debug {
    /// Send `prompt` to `model` and return the first candidate's text.
    fn generate(&self, model: &str, prompt: &str) -> ModelResult<String>;
}

// ============================================================================
// Factory Functions
// ============================================================================

/// Build both Gemini clients from one configuration.
pub fn create_gemini_models(
    config: GeminiConfig,
) -> ModelResult<(Arc<dyn EmbeddingModel>, Arc<dyn ChatModel>)> {
    let embedder = GeminiEmbeddingModel::new(config.clone())?;
    let chat = GeminiChatModel::new(config)?;
    Ok((Arc::new(embedder), Arc::new(chat)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_rejects_empty_key() {
        let err = create_gemini_models(GeminiConfig::new("")).unwrap_err();
        assert!(matches!(err, ModelError::InvalidConfig { .. }));
    }

    #[test]
    fn test_factory_builds_both_clients() {
        let (embedder, _chat) = create_gemini_models(GeminiConfig::new("key")).unwrap();
        assert_eq!(embedder.model_id(), "models/text-embedding-004");
    }
}
