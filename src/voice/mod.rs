//! Speech output
//!
//! A [`SpeechController`] owns one [`SpeechBackend`] chosen at startup:
//! the platform speech command when present, otherwise an HTTP synthesis
//! endpoint played through a local audio player.

mod backend;
mod catalog;
mod controller;
mod native;
mod playback;
mod tts;

pub use backend::{BackendPreference, SpeechBackend, select_backend};
pub use catalog::{DEFAULT_VOICE, Voice, VoiceCatalog, voice_language};
pub use controller::{SpeechController, SpeechSession, SpeechStatus};
pub use native::NativeSpeech;
pub use playback::AudioPlayer;
pub use tts::NetworkSpeech;
