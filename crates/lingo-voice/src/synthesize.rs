//! Text-to-speech narration via the Translate TTS endpoint.
//!
//! The endpoint caps input length, so long text is split into
//! whitespace-bounded chunks and the returned MP3 segments are
//! concatenated. The resulting clip is opaque binary audio handed to the
//! presentation layer unvalidated.

use async_trait::async_trait;
use tracing::{debug, info};

use lingo_core::error::{LingoError, Result};

const DEFAULT_BASE_URL: &str = "https://translate.google.com/translate_tts";

/// Per-request character cap enforced by the endpoint.
const MAX_CHUNK_CHARS: usize = 200;

/// Opaque binary audio for playback.
#[derive(Debug, Clone)]
pub struct AudioClip {
    pub data: Vec<u8>,
    pub mime: String,
}

/// Remote synthesis seam.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Render text to an audio clip in the given language.
    async fn synthesize(&self, text: &str, lang: &str) -> Result<AudioClip>;
}

pub struct GoogleSynthesizer {
    base_url: String,
    client: reqwest::Client,
}

impl GoogleSynthesizer {
    pub fn new(base_url: Option<&str>) -> Self {
        Self {
            base_url: base_url
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            client: reqwest::Client::new(),
        }
    }

    async fn fetch_chunk(&self, chunk: &str, lang: &str, total: usize) -> Result<Vec<u8>> {
        let url = format!(
            "{}?ie=UTF-8&client=tw-ob&tl={}&q={}&textlen={}",
            self.base_url,
            urlencoding::encode(lang),
            urlencoding::encode(chunk),
            total,
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| LingoError::SynthesisService(e.to_string()))?;

        if !response.status().is_success() {
            return Err(LingoError::SynthesisService(format!(
                "synthesis endpoint returned {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| LingoError::SynthesisService(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl Synthesizer for GoogleSynthesizer {
    async fn synthesize(&self, text: &str, lang: &str) -> Result<AudioClip> {
        let text = text.trim();
        if text.is_empty() {
            return Err(LingoError::InvalidInput("empty narration text".into()));
        }

        let chunks = split_for_tts(text, MAX_CHUNK_CHARS);
        debug!(lang, chunks = chunks.len(), chars = text.len(), "Synthesizing narration");

        // MP3 segments concatenate into one playable stream
        let mut data = Vec::new();
        for chunk in &chunks {
            let segment = self.fetch_chunk(chunk, lang, text.len()).await?;
            data.extend_from_slice(&segment);
        }

        info!(lang, bytes = data.len(), "Narration rendered");
        Ok(AudioClip {
            data,
            mime: "audio/mpeg".to_string(),
        })
    }
}

/// Split text into chunks of at most `max_chars` characters, preferring
/// whitespace boundaries. Never yields an empty chunk.
pub fn split_for_tts(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        // A single over-long word is split hard at the cap
        if word.chars().count() > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            let mut piece = String::new();
            for c in word.chars() {
                piece.push(c);
                if piece.chars().count() == max_chars {
                    chunks.push(std::mem::take(&mut piece));
                }
            }
            if !piece.is_empty() {
                current = piece;
            }
            continue;
        }

        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > max_chars {
            chunks.push(std::mem::take(&mut current));
            current.push_str(word);
        } else {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_single_chunk() {
        let chunks = split_for_tts("Hello world", 200);
        assert_eq!(chunks, vec!["Hello world"]);
    }

    #[test]
    fn test_split_on_whitespace() {
        let chunks = split_for_tts("one two three four", 9);
        assert_eq!(chunks, vec!["one two", "three", "four"]);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 9);
        }
    }

    #[test]
    fn test_overlong_word_split_hard() {
        let word = "a".repeat(25);
        let chunks = split_for_tts(&word, 10);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 10);
        assert_eq!(chunks[1].len(), 10);
        assert_eq!(chunks[2].len(), 5);
    }

    #[test]
    fn test_no_empty_chunks() {
        let chunks = split_for_tts("   spaced    out   ", 5);
        assert!(!chunks.is_empty());
        assert!(chunks.iter().all(|c| !c.is_empty()));
    }

    #[tokio::test]
    async fn test_empty_text_rejected() {
        let synth = GoogleSynthesizer::new(None);
        let err = synth.synthesize("  ", "en").await.unwrap_err();
        assert!(matches!(err, LingoError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_synthesis_error() {
        let synth = GoogleSynthesizer::new(Some("http://127.0.0.1:1"));
        let err = synth.synthesize("hello", "en").await.unwrap_err();
        assert!(matches!(err, LingoError::SynthesisService(_)));
    }
}
