//! Gemini embeddings via `batchEmbedContents`.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{qualified_model, EmbeddingTask, GeminiConfig, MAX_EMBED_BATCH};
use crate::error::{ModelError, ModelResult};
use crate::http::GeminiTransport;
use crate::EmbeddingModel;

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct BatchEmbedRequest<'a> {
    requests: Vec<EmbedRequest<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedRequest<'a> {
    model: &'a str,
    content: Content<'a>,
    task_type: EmbeddingTask,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<Embedding>,
}

#[derive(Debug, Deserialize)]
struct Embedding {
    values: Vec<f32>,
}

// ============================================================================
// GeminiEmbeddingModel
// ============================================================================

#[derive(Debug, Clone)]
pub struct GeminiEmbeddingModel {
    transport: GeminiTransport,
    model: String,
}

impl GeminiEmbeddingModel {
    pub fn new(config: GeminiConfig) -> ModelResult<Self> {
        let model = qualified_model(&config.embedding_model);
        info!("Using embedding model {}", model);
        Ok(Self {
            transport: GeminiTransport::new(config)?,
            model,
        })
    }

    fn embed_chunk(&self, texts: &[&str], task: EmbeddingTask) -> ModelResult<Vec<Vec<f32>>> {
        let request = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|&text| EmbedRequest {
                    model: &self.model,
                    content: Content {
                        parts: [Part { text }],
                    },
                    task_type: task,
                })
                .collect(),
        };

        let response: BatchEmbedResponse =
            self.transport
                .post(&self.model, "batchEmbedContents", &request)?;

        if response.embeddings.len() != texts.len() {
            return Err(ModelError::embedding_failed(
                &self.model,
                format!(
                    "expected {} embeddings, got {}",
                    texts.len(),
                    response.embeddings.len()
                ),
            ));
        }
        Ok(response.embeddings.into_iter().map(|e| e.values).collect())
    }
}

impl EmbeddingModel for GeminiEmbeddingModel {
    fn embed(&self, texts: &[&str], task: EmbeddingTask) -> ModelResult<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for (i, chunk) in texts.chunks(MAX_EMBED_BATCH).enumerate() {
            debug!("Embedding batch {} ({} texts, {})", i, chunk.len(), task);
            out.extend(self.embed_chunk(chunk, task)?);
        }
        Ok(out)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}
