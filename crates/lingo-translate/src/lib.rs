//! Language normalization — detection and translation.
//!
//! [`GoogleTranslator`] speaks the unauthenticated `translate_a/single`
//! web endpoint (`client=gtx`). The response is a nested JSON array:
//! translated segments at `[0][i][0]`, detected source language at `[2]`.
//!
//! All failures map to the soft `TranslationUnavailable` error; callers
//! fall back to treating text as already being in the target language.

use async_trait::async_trait;
use tracing::debug;

use lingo_core::error::{LingoError, Result};

const DEFAULT_BASE_URL: &str = "https://translate.googleapis.com";

/// Detection + translation seam for the turn pipeline.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Detect the language of non-empty text, returning a normalized
    /// ISO-639-1-ish code (e.g. "en", "fr").
    async fn detect(&self, text: &str) -> Result<String>;

    /// Translate non-empty text from `src` to `dest`.
    async fn translate(&self, text: &str, src: &str, dest: &str) -> Result<String>;
}

pub struct GoogleTranslator {
    base_url: String,
    client: reqwest::Client,
}

impl GoogleTranslator {
    pub fn new(base_url: Option<&str>) -> Self {
        Self {
            base_url: base_url
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            client: reqwest::Client::new(),
        }
    }

    async fn call(&self, text: &str, src: &str, dest: &str) -> Result<(String, String)> {
        if text.trim().is_empty() {
            return Err(LingoError::InvalidInput("empty text".into()));
        }

        let url = format!(
            "{}/translate_a/single?client=gtx&dt=t&sl={}&tl={}&q={}",
            self.base_url,
            urlencoding::encode(src),
            urlencoding::encode(dest),
            urlencoding::encode(text),
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| LingoError::TranslationUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(LingoError::TranslationUnavailable(format!(
                "translate endpoint returned {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| LingoError::TranslationUnavailable(e.to_string()))?;

        let (translated, detected) = parse_translate_response(&body)?;
        debug!(src, dest, detected, chars = text.len(), "Translation call");
        Ok((translated, detected))
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn detect(&self, text: &str) -> Result<String> {
        // Detect-only calls still go through the translate endpoint with
        // sl=auto; only the detected-language element is used.
        let (_, detected) = self.call(text, "auto", "en").await?;
        Ok(detected)
    }

    async fn translate(&self, text: &str, src: &str, dest: &str) -> Result<String> {
        let (translated, _) = self.call(text, src, dest).await?;
        Ok(translated)
    }
}

/// Parse the `translate_a/single` response: concatenated `[0][i][0]`
/// segments plus the detected language code at `[2]`.
pub fn parse_translate_response(body: &str) -> Result<(String, String)> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| LingoError::TranslationUnavailable(format!("bad response: {e}")))?;

    let segments = value
        .get(0)
        .and_then(|v| v.as_array())
        .ok_or_else(|| LingoError::TranslationUnavailable("missing segments".into()))?;

    let mut translated = String::new();
    for segment in segments {
        if let Some(text) = segment.get(0).and_then(|v| v.as_str()) {
            translated.push_str(text);
        }
    }

    let detected = value
        .get(2)
        .and_then(|v| v.as_str())
        .map(normalize_lang_code)
        .unwrap_or_else(|| "en".to_string());

    Ok((translated, detected))
}

/// Normalize a language code: lowercase, region stripped ("en-US" → "en").
pub fn normalize_lang_code(code: &str) -> String {
    let code = code.trim().to_ascii_lowercase();
    match code.split(['-', '_']).next() {
        Some(primary) if !primary.is_empty() => primary.to_string(),
        _ => "en".to_string(),
    }
}

/// Whether a normalized code means English.
pub fn is_english(code: &str) -> bool {
    normalize_lang_code(code) == "en"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_segment() {
        let body = r#"[[["Hello","Bonjour",null,null,10]],null,"fr",null,null,null,null,[]]"#;
        let (translated, detected) = parse_translate_response(body).unwrap();
        assert_eq!(translated, "Hello");
        assert_eq!(detected, "fr");
    }

    #[test]
    fn test_parse_multi_segment_concatenation() {
        let body = r#"[[["Hello, ","Bonjour, "],["world","le monde"]],null,"fr"]"#;
        let (translated, detected) = parse_translate_response(body).unwrap();
        assert_eq!(translated, "Hello, world");
        assert_eq!(detected, "fr");
    }

    #[test]
    fn test_parse_english_detection() {
        let body = r#"[[["Hello","Hello"]],null,"en"]"#;
        let (_, detected) = parse_translate_response(body).unwrap();
        assert_eq!(detected, "en");
    }

    #[test]
    fn test_parse_garbage_is_translation_unavailable() {
        let err = parse_translate_response("<html>rate limited</html>").unwrap_err();
        assert!(matches!(err, LingoError::TranslationUnavailable(_)));
        assert!(err.is_soft());
    }

    #[test]
    fn test_parse_missing_segments() {
        let err = parse_translate_response(r#"{"not":"an array"}"#).unwrap_err();
        assert!(matches!(err, LingoError::TranslationUnavailable(_)));
    }

    #[test]
    fn test_normalize_lang_code() {
        assert_eq!(normalize_lang_code("en-US"), "en");
        assert_eq!(normalize_lang_code("en_GB"), "en");
        assert_eq!(normalize_lang_code("FR"), "fr");
        assert_eq!(normalize_lang_code("zh-CN"), "zh");
        assert_eq!(normalize_lang_code(""), "en");
    }

    #[test]
    fn test_is_english() {
        assert!(is_english("en"));
        assert!(is_english("en-US"));
        assert!(!is_english("fr"));
    }

    #[tokio::test]
    async fn test_empty_text_rejected() {
        let translator = GoogleTranslator::new(Some("http://127.0.0.1:1"));
        let err = translator.detect("   ").await.unwrap_err();
        assert!(matches!(err, LingoError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_soft() {
        // Port 1 refuses connections without network traffic
        let translator = GoogleTranslator::new(Some("http://127.0.0.1:1"));
        let err = translator.translate("bonjour", "fr", "en").await.unwrap_err();
        assert!(err.is_soft());
    }
}
