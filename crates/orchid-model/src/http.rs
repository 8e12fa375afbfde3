//! Blocking JSON transport shared by the Gemini clients.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, trace};

use crate::config::GeminiConfig;
use crate::error::{ModelError, ModelResult};

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Clone)]
pub(crate) struct GeminiTransport {
    client: Client,
    config: GeminiConfig,
}

impl GeminiTransport {
    pub(crate) fn new(config: GeminiConfig) -> ModelResult<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ModelError::invalid_config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    pub(crate) fn config(&self) -> &GeminiConfig {
        &self.config
    }

    /// POST `body` to `{model}:{method}` and decode the JSON answer.
    pub(crate) fn post<B, R>(&self, model: &str, method: &str, body: &B) -> ModelResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let endpoint = self.config.endpoint(model, method);
        debug!("POST {}", endpoint);

        let response = self
            .client
            .post(&endpoint)
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(body)
            .send()
            .map_err(|e| ModelError::request(&endpoint, e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .map_err(|e| ModelError::request(&endpoint, e.to_string()))?;
        trace!("{} -> {} ({} bytes)", endpoint, status, text.len());

        if !status.is_success() {
            return Err(ModelError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text).map_err(|e| ModelError::unexpected_response(e.to_string()))
    }
}
