use thiserror::Error;

/// Error taxonomy for the turn pipeline and its remote collaborators.
///
/// `TranslationUnavailable` is soft: callers fall back to treating the text
/// as already being in the target language instead of aborting the turn.
/// The service variants are hard: they abort the current turn and are
/// reported to the presentation layer verbatim, with no automatic retry.
#[derive(Debug, Error)]
pub enum LingoError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Translation unavailable: {0}")]
    TranslationUnavailable(String),

    #[error("Recognition service error: {0}")]
    RecognitionService(String),

    #[error("Conversation service error: {0}")]
    ConversationService(String),

    #[error("Synthesis service error: {0}")]
    SynthesisService(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LingoError {
    /// Soft errors degrade gracefully; hard errors abort the current turn.
    pub fn is_soft(&self) -> bool {
        matches!(self, Self::TranslationUnavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, LingoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_soft_vs_hard() {
        assert!(LingoError::TranslationUnavailable("down".into()).is_soft());
        assert!(!LingoError::ConversationService("503".into()).is_soft());
        assert!(!LingoError::Config("missing key".into()).is_soft());
    }

    #[test]
    fn test_display_carries_detail() {
        let e = LingoError::SynthesisService("HTTP 502".into());
        assert!(e.to_string().contains("HTTP 502"));
    }
}
