//! Network text-to-speech: synthesize over HTTP, then play locally

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use super::backend::SpeechBackend;
use super::playback::AudioPlayer;
use crate::{Error, Result};

/// Synthesizes speech through an OpenAI-compatible `/audio/speech` endpoint
pub struct NetworkSpeech {
    client: reqwest::Client,
    endpoint: String,
    api_key: SecretString,
    model: String,
    player: AudioPlayer,
}

impl NetworkSpeech {
    /// Create a network speech backend
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new(
        base_url: &str,
        api_key: SecretString,
        model: String,
        player: AudioPlayer,
    ) -> Result<Self> {
        if api_key.expose_secret().is_empty() {
            return Err(Error::Config("API key required for network TTS".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}/audio/speech", base_url.trim_end_matches('/')),
            api_key,
            model,
            player,
        })
    }

    /// Synthesize text to speech
    ///
    /// # Returns
    ///
    /// Audio bytes (MP3 format)
    ///
    /// # Errors
    ///
    /// Returns error if synthesis fails
    pub async fn synthesize(&self, text: &str, voice_id: &str) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct TtsRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            response_format: &'a str,
        }

        let request = TtsRequest {
            model: &self.model,
            input: text,
            voice: voice_id,
            response_format: "mp3",
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key.expose_secret()))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("TTS error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        tracing::debug!(bytes = audio.len(), "speech synthesized");
        Ok(audio.to_vec())
    }
}

impl std::fmt::Debug for NetworkSpeech {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkSpeech")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("player", &self.player)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SpeechBackend for NetworkSpeech {
    fn name(&self) -> &'static str {
        "network"
    }

    async fn speak(&self, text: &str, voice_id: &str) -> Result<()> {
        let audio = self.synthesize(text, voice_id).await?;
        self.player.play_mp3(audio).await
    }
}
