//! Error types for Aikya

use thiserror::Error;

/// Result type alias for Aikya operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur inside the assistant core
///
/// None of these reach the view layer as failures: the dialog
/// orchestrator, news resolver and speech controller each convert them
/// into a user-facing sentence or a speech status.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Chat service error
    #[error("chat error: {0}")]
    Chat(String),

    /// News service error
    #[error("news error: {0}")]
    News(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// Audio output error
    #[error("audio error: {0}")]
    Audio(String),

    /// Unknown voice identifier
    #[error("unknown voice: {0}")]
    UnknownVoice(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error, with the request URL removed
    #[error("http error: {0}")]
    Http(reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

// Request URLs can carry API keys in their query string
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.without_url())
    }
}
