//! HTTP gateway — the presentation boundary for the turn pipeline.

pub mod routes;
pub mod server;
pub mod state;

pub use server::start_server;
pub use state::{AppState, ChatState};
