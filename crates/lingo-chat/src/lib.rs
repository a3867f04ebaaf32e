//! Turn pipeline — one user-initiated turn processed to completion.

pub mod pipeline;

use serde::{Deserialize, Serialize};

pub use pipeline::run_turn;

/// Incremental events emitted while a turn is processed, streamed to the
/// presentation layer as they happen.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnEvent {
    /// Language detected for the user input.
    Detected { lang: String },
    /// One English response fragment, already appended to the transcript.
    Fragment { text: String },
    /// The translated rendition of the preceding fragment.
    TranslatedFragment { text: String },
    /// The turn finished; the session handle now carries this exchange.
    Completed,
    /// The turn aborted; fragments already flushed remain in the transcript.
    Failed { message: String },
}

/// Outcome of a completed turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnSummary {
    pub detected_lang: String,
    pub fragments: usize,
    pub duration_ms: u64,
}
