//! Adapter layer for orchid-model.
//!
//! Maps `ModelError` onto [`OrchidError`]. Rate limits get their own variant
//! so the plan retry loop can tell them apart from other HTTP failures.

use orchid_model::{ModelError, ModelResult};

use crate::errors::{IntoOrchidResult, OrchidError};

/// Convert an orchid-model error to an orchid-core error.
pub fn from_model_error(err: ModelError) -> OrchidError {
    match err {
        ModelError::InvalidConfig { message } => OrchidError::ModelConfig { message },

        ModelError::Request { endpoint, message } => OrchidError::ModelRequest {
            reason: format!("{} ({})", message, endpoint),
        },

        ModelError::Http { status: 429, body } => OrchidError::ModelRateLimited { body },

        ModelError::Http { status, body } => OrchidError::ModelHttp { status, body },

        ModelError::UnexpectedResponse { message } => OrchidError::ModelResponse { reason: message },

        ModelError::EmbeddingFailed { model_id, message } => OrchidError::EmbeddingFailed {
            model: model_id,
            reason: message,
        },

        ModelError::Io(io_err) => OrchidError::Io(io_err),

        ModelError::Json(json_err) => OrchidError::ModelResponse {
            reason: json_err.to_string(),
        },
    }
}

impl<T> IntoOrchidResult<T> for ModelResult<T> {
    fn into_orchid_result(self) -> Result<T, OrchidError> {
        self.map_err(from_model_error)
    }
}
