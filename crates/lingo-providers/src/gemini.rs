//! Gemini (Google Generative AI) conversation client.
//!
//! Streams via the `streamGenerateContent` endpoint with SSE. Auth is an
//! API key in the query string.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio_stream::StreamExt;
use tracing::{debug, trace};

use lingo_core::config::ConversationConfig;
use lingo_core::error::{LingoError, Result};

use crate::sse::sse_events;
use crate::{ChatSession, ConversationClient, FragmentStream};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";

pub struct GeminiClient {
    base_url: String,
    model: String,
    api_key: String,
    max_output_tokens: Option<u32>,
    temperature: Option<f64>,
    system_prompt: Option<String>,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(config: &ConversationConfig, api_key: String) -> Self {
        Self {
            base_url: config
                .base_url
                .as_deref()
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            model: config
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_key,
            max_output_tokens: config.max_output_tokens,
            temperature: config.temperature,
            system_prompt: config.system_prompt.clone(),
            client: reqwest::Client::new(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_body(&self, session: &ChatSession, english_text: &str) -> GeminiRequest {
        let mut contents = session.contents().to_vec();
        contents.push(json!({
            "role": "user",
            "parts": [{ "text": english_text }],
        }));

        let generation_config = if self.max_output_tokens.is_some() || self.temperature.is_some() {
            Some(GenerationConfig {
                max_output_tokens: self.max_output_tokens,
                temperature: self.temperature,
            })
        } else {
            None
        };

        GeminiRequest {
            contents,
            system_instruction: self
                .system_prompt
                .as_ref()
                .map(|s| json!({ "parts": [{ "text": s }] })),
            generation_config,
        }
    }
}

// --- Gemini wire types ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiStreamChunk {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: Option<String>,
}

/// Extract the text fragment from one decoded SSE data payload.
/// Returns `None` for chunks with no text (metadata-only, finish markers).
fn fragment_from_chunk(data: &str) -> Option<String> {
    let chunk: GeminiStreamChunk = match serde_json::from_str(data) {
        Ok(c) => c,
        Err(e) => {
            trace!(%e, "Skipping unparseable Gemini chunk");
            return None;
        }
    };

    let candidate = chunk.candidates.first()?;
    if let Some(ref reason) = candidate.finish_reason {
        if reason != "STOP" {
            trace!(reason, "Gemini finish reason");
        }
    }

    candidate
        .content
        .as_ref()?
        .parts
        .iter()
        .find_map(|p| p.text.clone())
        .filter(|t| !t.is_empty())
}

#[async_trait]
impl ConversationClient for GeminiClient {
    async fn submit(&self, session: &ChatSession, english_text: &str) -> Result<FragmentStream> {
        let body = self.request_body(session, english_text);
        let url = format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse&key={}",
            self.base_url, self.model, self.api_key
        );

        debug!(model = %self.model, history = session.len(), "Streaming Gemini API");

        let response = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| LingoError::ConversationService(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LingoError::ConversationService(format!(
                "Gemini API error {status}: {body}"
            )));
        }

        let events = sse_events(response);
        let fragments = events.filter_map(|event| match event {
            Ok(event) => fragment_from_chunk(event.data.trim()).map(Ok),
            Err(e) => Some(Err(e)),
        });

        Ok(Box::pin(fragments))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> GeminiClient {
        GeminiClient::new(
            &ConversationConfig {
                model: None,
                api_key: None,
                api_key_env: None,
                base_url: None,
                max_output_tokens: Some(1024),
                temperature: Some(0.7),
                system_prompt: None,
            },
            "test-key".into(),
        )
    }

    #[test]
    fn test_defaults() {
        let client = test_client();
        assert_eq!(client.base_url, DEFAULT_BASE_URL);
        assert_eq!(client.model(), DEFAULT_MODEL);
    }

    #[test]
    fn test_request_body_appends_new_input_after_history() {
        let client = test_client();
        let mut session = ChatSession::new();
        session.record_exchange("Hi", "Hello");

        let body = client.request_body(&session, "How are you?");
        assert_eq!(body.contents.len(), 3);
        assert_eq!(body.contents[0]["role"], "user");
        assert_eq!(body.contents[1]["role"], "model");
        assert_eq!(body.contents[2]["role"], "user");
        assert_eq!(body.contents[2]["parts"][0]["text"], "How are you?");
    }

    #[test]
    fn test_request_serializes_camel_case() {
        let client = test_client();
        let body = client.request_body(&ChatSession::new(), "Hi");
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 1024);
        assert!((json["generationConfig"]["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_fragment_from_text_chunk() {
        let data = r#"{"candidates":[{"content":{"parts":[{"text":"Hello"}]}}]}"#;
        assert_eq!(fragment_from_chunk(data).as_deref(), Some("Hello"));
    }

    #[test]
    fn test_fragment_from_finish_chunk_is_none() {
        let data = r#"{"candidates":[{"finishReason":"STOP"}]}"#;
        assert_eq!(fragment_from_chunk(data), None);
    }

    #[test]
    fn test_fragment_from_metadata_chunk_is_none() {
        let data = r#"{"usageMetadata":{"promptTokenCount":10}}"#;
        assert_eq!(fragment_from_chunk(data), None);
    }

    #[test]
    fn test_fragment_skips_empty_text() {
        let data = r#"{"candidates":[{"content":{"parts":[{"text":""}]}}]}"#;
        assert_eq!(fragment_from_chunk(data), None);
    }
}
