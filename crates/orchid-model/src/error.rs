//! Error types for orchid-model.
//!
//! Messages say what failed and, where there is one, what to do about it.

use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Error)]
pub enum ModelError {
    // ========================================================================
    // Configuration errors
    // ========================================================================
    #[error("Invalid model configuration: {message}")]
    InvalidConfig { message: String },

    // ========================================================================
    // Transport errors
    // ========================================================================
    /// The request never produced an HTTP response (DNS, connect, timeout).
    #[error("Request to {endpoint} failed: {message}")]
    Request { endpoint: String, message: String },

    /// The API answered with a non-success status.
    #[error("{}", format_http_error(*.status, .body))]
    Http { status: u16, body: String },

    // ========================================================================
    // Response errors
    // ========================================================================
    /// The body parsed as JSON but not in the shape the API documents.
    #[error("Unexpected response format from Gemini API: {message}")]
    UnexpectedResponse { message: String },

    #[error("Embedding failed for model '{model_id}': {message}")]
    EmbeddingFailed { model_id: String, message: String },

    // ========================================================================
    // I/O errors
    // ========================================================================
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn format_http_error(status: u16, body: &str) -> String {
    let hint = match status {
        400 | 403 => "\n\nCheck that GEMINI_API_KEY is valid for the Generative Language API.",
        429 => "\n\nRate limit hit. Wait a moment and try again.",
        _ => "",
    };
    let body = body.trim();
    if body.is_empty() {
        format!("HTTP error {}{}", status, hint)
    } else {
        format!("HTTP error {}: {}{}", status, body, hint)
    }
}

impl ModelError {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    pub fn request(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Request {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    pub fn unexpected_response(message: impl Into<String>) -> Self {
        Self::UnexpectedResponse {
            message: message.into(),
        }
    }

    pub fn embedding_failed(model_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EmbeddingFailed {
            model_id: model_id.into(),
            message: message.into(),
        }
    }

    /// HTTP 429 from the API.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::Http { status: 429, .. })
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
