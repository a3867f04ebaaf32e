//! API route handlers.

use axum::{
    Json, Router,
    extract::{Multipart, Query, State},
    http::{StatusCode, header},
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::mpsc;
use tokio_stream::{StreamExt, wrappers::UnboundedReceiverStream};
use tracing::{error, info};

use lingo_chat::{TurnEvent, run_turn};
use lingo_core::error::LingoError;
use lingo_voice::AudioInput;

use crate::state::AppState;

pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/transcript", get(get_transcript))
        .route("/api/transcript/clear", post(clear_transcript))
        .route("/api/chat", post(chat))
        .route("/api/recognize", post(recognize))
        .route("/api/narrate", get(narrate))
        .with_state(state)
}

/// User-facing error response carrying the verbatim service message.
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn voice_disabled() -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: "Voice mode is disabled".into(),
        }
    }
}

impl From<LingoError> for ApiError {
    fn from(e: LingoError) -> Self {
        let status = match &e {
            LingoError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            LingoError::TranslationUnavailable(_)
            | LingoError::RecognitionService(_)
            | LingoError::ConversationService(_)
            | LingoError::SynthesisService(_) => StatusCode::BAD_GATEWAY,
            LingoError::Config(_) | LingoError::Io(_) | LingoError::Json(_) | LingoError::Other(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "model": state.config.model(),
        "voice": state.config.voice_enabled(),
    }))
}

async fn get_transcript(State(state): State<AppState>) -> impl IntoResponse {
    let chat = state.chat.lock().await;
    Json(json!({ "turns": chat.transcript.all() }))
}

async fn clear_transcript(State(state): State<AppState>) -> StatusCode {
    let mut chat = state.chat.lock().await;
    chat.transcript.clear();
    info!("Transcript cleared");
    StatusCode::NO_CONTENT
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    message: String,
}

/// Run one turn, streaming [`TurnEvent`]s back as SSE. The chat mutex is
/// held for the whole turn, so concurrent requests queue up and each turn
/// runs to completion before the next starts.
async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Sse<impl futures::Stream<Item = Result<Event, axum::Error>>>, ApiError> {
    let message = req.message.trim().to_string();
    if message.is_empty() {
        return Err(ApiError::bad_request("message must be non-empty"));
    }

    let (tx, rx) = mpsc::unbounded_channel::<TurnEvent>();
    tokio::spawn(async move {
        let mut guard = state.chat.lock().await;
        let chat = &mut *guard;
        if let Err(e) = run_turn(
            &message,
            &mut chat.transcript,
            &mut chat.session,
            state.translator.as_ref(),
            state.conversation.as_ref(),
            &tx,
        )
        .await
        {
            // The pipeline already emitted a Failed event
            error!(%e, "Turn aborted");
        }
    });

    let stream = UnboundedReceiverStream::new(rx).map(|event| Event::default().json_data(&event));
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

#[derive(Debug, Serialize)]
struct RecognizeResponse {
    text: String,
    recognized: bool,
}

/// Accept one captured utterance as multipart audio and return the
/// recognized text. A soft no-match is a success with `recognized=false`;
/// nothing is submitted to the conversation service.
async fn recognize(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<RecognizeResponse>, ApiError> {
    if !state.config.voice_enabled() {
        return Err(ApiError::voice_disabled());
    }

    let mut audio: Option<AudioInput> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.to_string()))?
    {
        if field.name() == Some("audio") {
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::bad_request(e.to_string()))?
                .to_vec();
            audio = Some(AudioInput { data, content_type });
        }
    }

    let audio = audio.ok_or_else(|| ApiError::bad_request("missing 'audio' field"))?;

    match state.recognizer.recognize(&audio).await? {
        Some(text) => Ok(Json(RecognizeResponse {
            text,
            recognized: true,
        })),
        None => Ok(Json(RecognizeResponse {
            text: String::new(),
            recognized: false,
        })),
    }
}

#[derive(Debug, Deserialize)]
struct NarrateParams {
    text: String,
    #[serde(default)]
    lang: Option<String>,
}

/// Render narration audio for one bot turn. The clip is opaque bytes; the
/// browser's audio element handles playback.
async fn narrate(
    State(state): State<AppState>,
    Query(params): Query<NarrateParams>,
) -> Result<Response, ApiError> {
    if !state.config.voice_enabled() {
        return Err(ApiError::voice_disabled());
    }

    let lang = params.lang.as_deref().unwrap_or("en");
    let clip = state.synthesizer.synthesize(&params.text, lang).await?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, clip.mime)],
        clip.data,
    )
        .into_response())
}
