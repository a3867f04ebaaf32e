//! Gateway shared state.

use std::sync::Arc;

use tokio::sync::Mutex;

use lingo_core::config::Config;
use lingo_core::error::Result;
use lingo_core::transcript::TranscriptStore;
use lingo_providers::{ChatSession, ConversationClient, GeminiClient};
use lingo_translate::{GoogleTranslator, Translator};
use lingo_voice::{GoogleRecognizer, GoogleSynthesizer, SpeechRecognizer, Synthesizer};

/// Transcript plus session handle, guarded by one mutex so exactly one
/// turn is processed at a time (single-writer, no cancellation).
#[derive(Default)]
pub struct ChatState {
    pub transcript: TranscriptStore,
    pub session: ChatSession,
}

/// Shared gateway state. Service objects sit behind trait objects so tests
/// inject mocks.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub chat: Arc<Mutex<ChatState>>,
    pub translator: Arc<dyn Translator>,
    pub conversation: Arc<dyn ConversationClient>,
    pub recognizer: Arc<dyn SpeechRecognizer>,
    pub synthesizer: Arc<dyn Synthesizer>,
}

impl AppState {
    /// Build state against the real remote services. Fails when the API
    /// credential is missing (startup-fatal).
    pub fn new(config: Arc<Config>) -> Result<Self> {
        let api_key = config.require_api_key()?;

        let conversation_config = config.conversation.clone().unwrap_or_default();
        let conversation: Arc<dyn ConversationClient> =
            Arc::new(GeminiClient::new(&conversation_config, api_key.clone()));

        let translator: Arc<dyn Translator> = Arc::new(GoogleTranslator::new(
            config
                .translation
                .as_ref()
                .and_then(|t| t.base_url.as_deref()),
        ));

        let recognition = config.voice.as_ref().and_then(|v| v.recognition.as_ref());
        let recognizer: Arc<dyn SpeechRecognizer> = Arc::new(GoogleRecognizer::new(
            recognition.and_then(|r| r.base_url.as_deref()),
            &config.recognition_language(),
            recognition
                .and_then(|r| r.resolve_api_key())
                .unwrap_or(api_key),
        ));

        let synthesizer: Arc<dyn Synthesizer> = Arc::new(GoogleSynthesizer::new(
            config
                .voice
                .as_ref()
                .and_then(|v| v.synthesis.as_ref())
                .and_then(|s| s.base_url.as_deref()),
        ));

        Ok(Self::with_services(
            config,
            translator,
            conversation,
            recognizer,
            synthesizer,
        ))
    }

    /// Build state with injected service objects (tests, alternative stacks).
    pub fn with_services(
        config: Arc<Config>,
        translator: Arc<dyn Translator>,
        conversation: Arc<dyn ConversationClient>,
        recognizer: Arc<dyn SpeechRecognizer>,
        synthesizer: Arc<dyn Synthesizer>,
    ) -> Self {
        Self {
            config,
            chat: Arc::new(Mutex::new(ChatState::default())),
            translator,
            conversation,
            recognizer,
            synthesizer,
        }
    }
}
