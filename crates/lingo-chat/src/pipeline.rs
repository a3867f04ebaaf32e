//! The chat turn sequencing: detect → translate in → submit → per-fragment
//! translate out → append.

use std::time::Instant;

use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};

use lingo_core::error::{LingoError, Result};
use lingo_core::transcript::{Speaker, TranscriptStore, Turn};
use lingo_providers::{ChatSession, ConversationClient};
use lingo_translate::{Translator, is_english, normalize_lang_code};

use crate::{TurnEvent, TurnSummary};

/// Process one turn to completion.
///
/// Hard failures abort the turn: a submit error leaves the transcript
/// untouched, a mid-stream error keeps only the fragments already flushed.
/// In both cases the session handle is not updated. Translation failures
/// are soft — the text is passed through untranslated.
pub async fn run_turn(
    input: &str,
    transcript: &mut TranscriptStore,
    session: &mut ChatSession,
    translator: &dyn Translator,
    conversation: &dyn ConversationClient,
    event_tx: &mpsc::UnboundedSender<TurnEvent>,
) -> Result<TurnSummary> {
    match turn_inner(input, transcript, session, translator, conversation, event_tx).await {
        Ok(summary) => Ok(summary),
        Err(e) => {
            let _ = event_tx.send(TurnEvent::Failed {
                message: e.to_string(),
            });
            Err(e)
        }
    }
}

async fn turn_inner(
    input: &str,
    transcript: &mut TranscriptStore,
    session: &mut ChatSession,
    translator: &dyn Translator,
    conversation: &dyn ConversationClient,
    event_tx: &mpsc::UnboundedSender<TurnEvent>,
) -> Result<TurnSummary> {
    let start = Instant::now();
    let input = input.trim();
    if input.is_empty() {
        return Err(LingoError::InvalidInput("empty input".into()));
    }

    // 1. Detect the input language; fall back to English when the
    //    translation service is unavailable.
    let detected = match translator.detect(input).await {
        Ok(lang) => normalize_lang_code(&lang),
        Err(e) if e.is_soft() => {
            warn!(%e, "Language detection failed, treating input as English");
            "en".to_string()
        }
        Err(e) => return Err(e),
    };
    let translate_back = !is_english(&detected);
    let _ = event_tx.send(TurnEvent::Detected {
        lang: detected.clone(),
    });
    debug!(lang = %detected, "Input language detected");

    // 2. Normalize the input to English before submission.
    let english_input = if translate_back {
        match translator.translate(input, &detected, "en").await {
            Ok(text) => text,
            Err(e) if e.is_soft() => {
                warn!(%e, "Input translation failed, submitting untranslated");
                input.to_string()
            }
            Err(e) => return Err(e),
        }
    } else {
        input.to_string()
    };

    // 3. Open the response stream. Failing here leaves the transcript
    //    untouched for this turn.
    let mut stream = conversation.submit(session, &english_input).await?;

    // 4. The user turn carries the original (untranslated) text.
    transcript.append(Turn::now(Speaker::User, input));

    // 5. Append fragments in delivery order as they arrive.
    let mut fragment_count = 0usize;
    let mut full_english = String::new();

    while let Some(item) = stream.next().await {
        let fragment = item?;
        if fragment.is_empty() {
            continue;
        }

        full_english.push_str(&fragment);
        fragment_count += 1;
        transcript.append(Turn::now(Speaker::BotEnglish, fragment.clone()));
        let _ = event_tx.send(TurnEvent::Fragment {
            text: fragment.clone(),
        });

        if translate_back {
            let translated = match translator.translate(&fragment, "en", &detected).await {
                Ok(text) => text,
                Err(e) if e.is_soft() => {
                    warn!(%e, "Fragment translation failed, passing through English");
                    fragment.clone()
                }
                Err(e) => return Err(e),
            };
            transcript.append(Turn::now(Speaker::BotTranslated, translated.clone()));
            let _ = event_tx.send(TurnEvent::TranslatedFragment { text: translated });
        }
    }

    // 6. Only a fully drained stream advances the session history.
    session.record_exchange(&english_input, &full_english);
    let _ = event_tx.send(TurnEvent::Completed);

    let duration_ms = start.elapsed().as_millis() as u64;
    info!(
        lang = %detected,
        fragments = fragment_count,
        duration_ms,
        "Turn completed"
    );

    Ok(TurnSummary {
        detected_lang: detected,
        fragments: fragment_count,
        duration_ms,
    })
}
