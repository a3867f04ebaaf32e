//! Voice support — speech recognition of captured audio and narration
//! rendering (text to audio clip). Device capture itself happens in the
//! browser; this crate only talks to the remote services.

pub mod recognize;
pub mod synthesize;

pub use recognize::{AudioInput, GoogleRecognizer, SpeechRecognizer};
pub use synthesize::{AudioClip, GoogleSynthesizer, Synthesizer};
