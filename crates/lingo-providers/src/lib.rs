//! Conversation client abstraction.
//!
//! The [`ConversationClient`] trait is the seam between the turn pipeline
//! and the remote generative-text service. Responses are streamed as a
//! finite, forward-only sequence of text fragments.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde_json::json;

use lingo_core::error::Result;

pub mod gemini;
pub mod sse;

pub use gemini::GeminiClient;

/// A finite stream of response fragments, terminated by end-of-stream.
/// Not restartable — re-submission requires a new `submit` call.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Opaque conversation context correlating prior turns.
///
/// Holds the accumulated request history carried forward across
/// submissions. Created once at startup; never persisted. Updated only
/// via [`ChatSession::record_exchange`] after a fully successful turn, so
/// a failed turn leaves no partial state behind.
#[derive(Debug, Clone, Default)]
pub struct ChatSession {
    contents: Vec<serde_json::Value>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// History entries in wire format, oldest first.
    pub fn contents(&self) -> &[serde_json::Value] {
        &self.contents
    }

    /// Number of recorded exchanges (user + model pairs count as 2).
    pub fn len(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    /// Record one completed exchange. Called exactly once per successful
    /// turn, after the response stream has fully drained.
    pub fn record_exchange(&mut self, user_text: &str, model_text: &str) {
        self.contents.push(json!({
            "role": "user",
            "parts": [{ "text": user_text }],
        }));
        self.contents.push(json!({
            "role": "model",
            "parts": [{ "text": model_text }],
        }));
    }

    pub fn reset(&mut self) {
        self.contents.clear();
    }
}

/// Streaming client for a remote generative-text service.
#[async_trait]
pub trait ConversationClient: Send + Sync {
    /// Submit English-language input against an ongoing session and stream
    /// back response fragments in delivery order.
    ///
    /// The session is read-only here; callers record the exchange after the
    /// stream completes so a mid-stream failure leaves the handle untouched.
    async fn submit(&self, session: &ChatSession, english_text: &str) -> Result<FragmentStream>;
}
