//! Speech synthesis backends and their selection

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;

use super::native::NativeSpeech;
use super::playback::AudioPlayer;
use super::tts::NetworkSpeech;
use crate::config::VoiceConfig;
use crate::{Error, Result};

/// A synthesis capability that can speak one utterance at a time
///
/// `speak` resolves once playback has finished. Dropping the returned
/// future must halt any audio it started; the controller relies on this
/// to stop a session.
#[async_trait]
pub trait SpeechBackend: Send + Sync {
    /// Short backend name for logs and status
    fn name(&self) -> &'static str;

    /// Speak `text` with `voice_id`
    async fn speak(&self, text: &str, voice_id: &str) -> Result<()>;
}

/// Which backend to select at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendPreference {
    /// Native platform synthesis, falling back to network
    #[default]
    Auto,
    /// Platform speech command only
    Native,
    /// HTTP speech endpoint only
    Network,
    /// No speech output
    None,
}

impl FromStr for BackendPreference {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" | "" => Ok(Self::Auto),
            "native" | "platform" => Ok(Self::Native),
            "network" | "http" => Ok(Self::Network),
            "none" | "off" => Ok(Self::None),
            other => Err(Error::Config(format!("unknown speech backend: {other}"))),
        }
    }
}

impl fmt::Display for BackendPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Auto => "auto",
            Self::Native => "native",
            Self::Network => "network",
            Self::None => "none",
        };
        f.write_str(name)
    }
}

/// Select the speech backend for this process
///
/// Returns `None` when speech is disabled or nothing usable is present;
/// that is not an error, speech just becomes unavailable.
#[must_use]
pub fn select_backend(config: &VoiceConfig) -> Option<Arc<dyn SpeechBackend>> {
    if !config.enabled {
        tracing::info!("speech output disabled");
        return None;
    }

    let backend = match config.backend {
        BackendPreference::None => None,
        BackendPreference::Native => native_backend(),
        BackendPreference::Network => network_backend(config),
        BackendPreference::Auto => native_backend().or_else(|| network_backend(config)),
    };

    match &backend {
        Some(b) => tracing::info!(backend = b.name(), preference = %config.backend, "speech backend selected"),
        None => tracing::warn!(preference = %config.backend, "no speech backend available"),
    }

    backend
}

fn native_backend() -> Option<Arc<dyn SpeechBackend>> {
    NativeSpeech::detect().map(|n| Arc::new(n) as Arc<dyn SpeechBackend>)
}

fn network_backend(config: &VoiceConfig) -> Option<Arc<dyn SpeechBackend>> {
    let api_key = config.tts_api_key.clone()?;
    let Some(player) = AudioPlayer::detect() else {
        tracing::debug!("network speech configured but no audio player found");
        return None;
    };

    match NetworkSpeech::new(&config.tts_url, api_key, config.tts_model.clone(), player) {
        Ok(speech) => Some(Arc::new(speech)),
        Err(e) => {
            tracing::warn!(error = %e, "network speech unavailable");
            None
        }
    }
}
