//! Error types for orchid-core.

use std::path::PathBuf;

use thiserror::Error;

pub type OrchidResult<T> = Result<T, OrchidError>;

/// Domain-specific errors for Orchid operations.
#[derive(Error, Debug)]
pub enum OrchidError {
    // =========================================================================
    // Setup Errors
    // =========================================================================
    /// `orchid init` has never been run for this project.
    #[error("Project not initialized! Run `orchid init` first.")]
    NotInitialized,

    /// No usable Gemini key in the environment or `.env`.
    #[error("GEMINI_API_KEY is not set. Please add it to your .env.")]
    MissingApiKey,

    #[error("Global config invalid: {0}")]
    InvalidGlobalConfig(String),

    /// A configuration value is invalid.
    #[error("Invalid configuration: {message}. {hint}")]
    InvalidConfiguration {
        message: String,
        /// Actionable hint on how to fix it.
        hint: String,
    },

    #[error("Path not found: {0}")]
    PathNotFound(String),

    /// A plan or user file path points outside the project root.
    #[error("Path `{path}` is outside the project root")]
    PathOutsideProject { path: String },

    #[error("Invalid package.json at `{path}`: {message}")]
    InvalidPackageJson { path: PathBuf, message: String },

    // =========================================================================
    // Vector Index Errors
    // =========================================================================
    #[error("Vector index I/O error at `{path}`: {message}")]
    VectorIndexIo { path: PathBuf, message: String },

    #[error("Vector index parse error at `{path}`: {message}")]
    VectorIndexParse { path: PathBuf, message: String },

    /// The collection on disk was built with different settings.
    #[error("Vector index incompatible: {reason}. Run `orchid init` to rebuild it.")]
    VectorIndexIncompatible { reason: String },

    #[error("Vector index backend `{backend}` is unavailable: {reason}")]
    VectorIndexBackendUnavailable { backend: String, reason: String },

    // =========================================================================
    // Model Errors
    // =========================================================================
    #[error("Model configuration error: {message}")]
    ModelConfig { message: String },

    /// Transport failure talking to Gemini.
    #[error("Error during API request: {reason}")]
    ModelRequest { reason: String },

    /// HTTP 429 from Gemini.
    #[error("Gemini rate limit hit: {body}")]
    ModelRateLimited { body: String },

    #[error("Gemini returned HTTP {status}: {body}")]
    ModelHttp { status: u16, body: String },

    #[error("Unexpected response format from Gemini API: {reason}")]
    ModelResponse { reason: String },

    #[error("Embedding with `{model}` failed: {reason}")]
    EmbeddingFailed { model: String, reason: String },

    // =========================================================================
    // Interaction Errors
    // =========================================================================
    /// The terminal prompt could not be shown or read.
    #[error("Prompt failed: {0}")]
    Prompt(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Converts lower-layer results (`DbResult`, `ModelResult`) into Orchid results.
///
/// Implemented in [`crate::db_adapter`] and [`crate::model_adapter`].
pub trait IntoOrchidResult<T> {
    fn into_orchid_result(self) -> Result<T, OrchidError>;
}

impl OrchidError {
    /// Follow-up suggestion shown under the error by the CLI.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run `orchid init` in the project root."),
            Self::MissingApiKey => {
                Some("Add GEMINI_API_KEY=<your key> to the project's .env file or your shell.")
            }
            Self::VectorIndexIncompatible { .. } => Some("Run `orchid init` to rebuild the index."),
            Self::ModelRateLimited { .. } => Some("Wait a minute and try again."),
            _ => None,
        }
    }

    /// Whether a plan request should be retried after this error.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::ModelRateLimited { .. })
    }
}
