//! Incremental SSE (Server-Sent Events) decoding.
//!
//! [`SseDecoder`] is a pure push parser: feed it body chunks as they
//! arrive and collect completed events. [`sse_events`] adapts a
//! `reqwest::Response` body into a stream of events.

use futures::Stream;
use tokio_stream::StreamExt;

use lingo_core::error::{LingoError, Result};

/// A dispatched SSE event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub event: Option<String>,
    pub data: String,
}

/// Push parser accumulating partial lines across body chunks.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: String,
    event_name: Option<String>,
    data_lines: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one body chunk; returns any events completed by it.
    pub fn feed(&mut self, chunk: &str) -> Vec<SseEvent> {
        self.buffer.push_str(chunk);
        let mut events = Vec::new();

        while let Some(newline_pos) = self.buffer.find('\n') {
            let line = self.buffer[..newline_pos]
                .trim_end_matches('\r')
                .to_string();
            self.buffer.drain(..=newline_pos);

            if line.is_empty() {
                // Blank line dispatches the pending event
                if let Some(event) = self.take_pending() {
                    events.push(event);
                }
            } else if let Some(value) = line.strip_prefix("data:") {
                self.data_lines.push(value.trim_start().to_string());
            } else if let Some(value) = line.strip_prefix("event:") {
                self.event_name = Some(value.trim_start().to_string());
            }
            // Comments (leading ':') and unknown fields are ignored
        }

        events
    }

    /// Dispatch any event left pending when the body ends.
    pub fn finish(&mut self) -> Option<SseEvent> {
        self.take_pending()
    }

    fn take_pending(&mut self) -> Option<SseEvent> {
        if self.data_lines.is_empty() {
            self.event_name = None;
            return None;
        }
        Some(SseEvent {
            event: self.event_name.take(),
            data: std::mem::take(&mut self.data_lines).join("\n"),
        })
    }
}

/// Decode a reqwest response body as a stream of SSE events.
pub fn sse_events(response: reqwest::Response) -> impl Stream<Item = Result<SseEvent>> {
    struct State {
        body: std::pin::Pin<
            Box<dyn Stream<Item = std::result::Result<bytes::Bytes, reqwest::Error>> + Send>,
        >,
        decoder: SseDecoder,
        ready: std::collections::VecDeque<SseEvent>,
        done: bool,
    }

    let state = State {
        body: Box::pin(response.bytes_stream()),
        decoder: SseDecoder::new(),
        ready: std::collections::VecDeque::new(),
        done: false,
    };

    futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(event) = state.ready.pop_front() {
                return Some((Ok(event), state));
            }
            if state.done {
                return None;
            }
            match state.body.next().await {
                Some(Ok(chunk)) => {
                    let text = String::from_utf8_lossy(&chunk).into_owned();
                    state.ready.extend(state.decoder.feed(&text));
                }
                Some(Err(e)) => {
                    state.done = true;
                    return Some((
                        Err(LingoError::ConversationService(format!("SSE stream error: {e}"))),
                        state,
                    ));
                }
                None => {
                    state.done = true;
                    if let Some(event) = state.decoder.finish() {
                        state.ready.push_back(event);
                    }
                }
            }
        }
    })
}
