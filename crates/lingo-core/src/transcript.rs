//! Transcript model — ordered, append-only log of conversation turns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who produced a turn.
///
/// A bot response yields one `BotEnglish` turn per streamed fragment and,
/// when the detected input language is non-English, one `BotTranslated`
/// turn immediately after each of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    User,
    BotEnglish,
    BotTranslated,
}

/// One attributed unit of transcript content. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn now(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// In-memory, append-only transcript for the process lifetime.
///
/// Not persisted. Single-writer: the gateway serializes turn processing
/// behind one mutex, so no internal locking is needed here.
#[derive(Debug, Default)]
pub struct TranscriptStore {
    turns: Vec<Turn>,
}

impl TranscriptStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// All turns in submission order.
    pub fn all(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Destructive and irreversible within the process lifetime.
    pub fn clear(&mut self) {
        self.turns.clear();
    }
}
