//! Gemini text generation via `generateContent`.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::GeminiConfig;
use crate::error::{ModelError, ModelResult};
use crate::http::GeminiTransport;
use crate::ChatModel;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: [RequestContent<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: [RequestPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateResponse {
    /// `candidates[0].content.parts[0].text`, the only field Orchid reads.
    pub(crate) fn into_text(self) -> ModelResult<String> {
        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| ModelError::unexpected_response("no candidates in response"))?;
        let content = candidate
            .content
            .ok_or_else(|| ModelError::unexpected_response("candidate has no content"))?;
        content
            .parts
            .into_iter()
            .next()
            .and_then(|p| p.text)
            .ok_or_else(|| ModelError::unexpected_response("candidate has no text part"))
    }
}

/// Single-turn generation client. The model is chosen per call so one client
/// serves the classifiers and the planner.
#[derive(Debug, Clone)]
pub struct GeminiChatModel {
    transport: GeminiTransport,
}

impl GeminiChatModel {
    pub fn new(config: GeminiConfig) -> ModelResult<Self> {
        Ok(Self {
            transport: GeminiTransport::new(config)?,
        })
    }

    pub fn config(&self) -> &GeminiConfig {
        self.transport.config()
    }
}

impl ChatModel for GeminiChatModel {
    fn generate(&self, model: &str, prompt: &str) -> ModelResult<String> {
        debug!("Generating with {} ({} prompt chars)", model, prompt.len());
        let request = GenerateRequest {
            contents: [RequestContent {
                parts: [RequestPart { text: prompt }],
            }],
        };
        let response: GenerateResponse =
            self.transport.post(model, "generateContent", &request)?;
        response.into_text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[test]
    fn test_text_extraction() {
        let response: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"question\nAsks about schema."}],"role":"model"}}]}"#,
        )
        .unwrap();
        assert_eq!(response.into_text().unwrap(), "question\nAsks about schema.");
    }

    #[test]
    fn test_missing_fields_are_unexpected_response() {
        for body in [
            r#"{}"#,
            r#"{"candidates":[{"finishReason":"SAFETY"}]}"#,
            r#"{"candidates":[{"content":{"parts":[]}}]}"#,
        ] {
            let response: GenerateResponse = serde_json::from_str(body).unwrap();
            assert!(matches!(
                response.into_text(),
                Err(ModelError::UnexpectedResponse { .. })
            ));
        }
    }

    #[test]
    fn test_generate_posts_prompt_to_model() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock(
                "POST",
                Matcher::Regex(r"^/models/gemini-2.5-pro:generateContent".to_string()),
            )
            .match_body(Matcher::PartialJsonString(
                r#"{"contents":[{"parts":[{"text":"hello"}]}]}"#.to_string(),
            ))
            .with_status(200)
            .with_body(r#"{"candidates":[{"content":{"parts":[{"text":"hi"}]}}]}"#)
            .create();

        let chat =
            GeminiChatModel::new(GeminiConfig::new("k").with_base_url(server.url())).unwrap();
        assert_eq!(chat.generate("gemini-2.5-pro", "hello").unwrap(), "hi");
        mock.assert();
    }

    #[test]
    fn test_rate_limit_is_reported() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", Matcher::Any)
            .with_status(429)
            .with_body(r#"{"error":{"status":"RESOURCE_EXHAUSTED"}}"#)
            .create();

        let chat =
            GeminiChatModel::new(GeminiConfig::new("k").with_base_url(server.url())).unwrap();
        let err = chat.generate("gemini-2.5-pro", "hello").unwrap_err();
        assert!(err.is_rate_limited());
    }
}
