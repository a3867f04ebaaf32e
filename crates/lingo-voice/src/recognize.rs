//! Speech-to-text from captured audio bytes.
//!
//! [`GoogleRecognizer`] posts audio to the Google Speech API v2 endpoint.
//! The response is JSON-lines; the first line with a non-empty `result`
//! array carries the transcript. An empty result set is a soft no-match
//! (`Ok(None)`), not an error — the caller displays it and submits nothing.

use async_trait::async_trait;
use tracing::{debug, info};

use lingo_core::error::{LingoError, Result};

const DEFAULT_BASE_URL: &str = "http://www.google.com/speech-api/v2/recognize";

/// One captured utterance as uploaded by the presentation layer.
#[derive(Debug, Clone)]
pub struct AudioInput {
    pub data: Vec<u8>,
    /// e.g. "audio/x-flac; rate=16000" or "audio/l16; rate=16000"
    pub content_type: String,
}

/// Remote recognition seam. `Ok(None)` means the service could not map
/// the audio to text (soft failure); `Err` means a connectivity or
/// protocol fault.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    async fn recognize(&self, audio: &AudioInput) -> Result<Option<String>>;
}

pub struct GoogleRecognizer {
    base_url: String,
    language: String,
    api_key: String,
    client: reqwest::Client,
}

impl GoogleRecognizer {
    pub fn new(base_url: Option<&str>, language: &str, api_key: String) -> Self {
        Self {
            base_url: base_url
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            language: language.to_string(),
            api_key,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl SpeechRecognizer for GoogleRecognizer {
    async fn recognize(&self, audio: &AudioInput) -> Result<Option<String>> {
        if audio.data.is_empty() {
            return Ok(None);
        }

        let url = format!(
            "{}?client=chromium&lang={}&key={}",
            self.base_url,
            urlencoding::encode(&self.language),
            self.api_key,
        );

        debug!(bytes = audio.data.len(), lang = %self.language, "Sending audio for recognition");

        let response = self
            .client
            .post(&url)
            .header("content-type", &audio.content_type)
            .body(audio.data.clone())
            .send()
            .await
            .map_err(|e| LingoError::RecognitionService(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LingoError::RecognitionService(format!(
                "recognition endpoint returned {status}: {body}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| LingoError::RecognitionService(e.to_string()))?;

        let transcript = parse_recognition_response(&body);
        match &transcript {
            Some(text) => info!(chars = text.len(), "Utterance recognized"),
            None => info!("No speech recognized in utterance"),
        }
        Ok(transcript)
    }
}

/// Parse the JSON-lines recognition response. The service emits an empty
/// `{"result":[]}` line first, then (on a match) a line whose first result
/// holds `alternative[0].transcript`.
pub fn parse_recognition_response(body: &str) -> Option<String> {
    for line in body.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Ok(value) = serde_json::from_str::<serde_json::Value>(line) else {
            continue;
        };
        let Some(results) = value.get("result").and_then(|r| r.as_array()) else {
            continue;
        };
        if results.is_empty() {
            continue;
        }
        let transcript = results[0]
            .get("alternative")
            .and_then(|a| a.as_array())
            .and_then(|a| a.first())
            .and_then(|alt| alt.get("transcript"))
            .and_then(|t| t.as_str())
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        if transcript.is_some() {
            return transcript;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_match() {
        let body = concat!(
            "{\"result\":[]}\n",
            "{\"result\":[{\"alternative\":[{\"transcript\":\"hello world\",\"confidence\":0.92}],\"final\":true}],\"result_index\":0}\n",
        );
        assert_eq!(parse_recognition_response(body).as_deref(), Some("hello world"));
    }

    #[test]
    fn test_parse_no_match_is_none() {
        assert_eq!(parse_recognition_response("{\"result\":[]}\n"), None);
    }

    #[test]
    fn test_parse_empty_body() {
        assert_eq!(parse_recognition_response(""), None);
        assert_eq!(parse_recognition_response("\n\n"), None);
    }

    #[test]
    fn test_parse_skips_garbage_lines() {
        let body = "not json\n{\"result\":[{\"alternative\":[{\"transcript\":\"ok\"}]}]}\n";
        assert_eq!(parse_recognition_response(body).as_deref(), Some("ok"));
    }

    #[tokio::test]
    async fn test_empty_audio_is_no_match() {
        let recognizer = GoogleRecognizer::new(None, "en-US", "key".into());
        let result = recognizer
            .recognize(&AudioInput {
                data: vec![],
                content_type: "audio/x-flac; rate=16000".into(),
            })
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_hard_error() {
        let recognizer =
            GoogleRecognizer::new(Some("http://127.0.0.1:1"), "en-US", "key".into());
        let err = recognizer
            .recognize(&AudioInput {
                data: vec![0u8; 16],
                content_type: "audio/x-flac; rate=16000".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, LingoError::RecognitionService(_)));
        assert!(!err.is_soft());
    }
}
