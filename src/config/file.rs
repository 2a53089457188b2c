//! TOML configuration file loading
//!
//! Supports `~/.config/aikya/config.toml` as a persistent config source.
//! All fields are optional: the file is a partial overlay on top of defaults.

use std::path::PathBuf;

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct AikyaConfigFile {
    /// Chat service configuration
    #[serde(default)]
    pub chat: ChatFileConfig,

    /// News lookup configuration
    #[serde(default)]
    pub news: NewsFileConfig,

    /// Speech output configuration
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// Progressive reveal pacing
    #[serde(default)]
    pub reveal: RevealFileConfig,

    /// Remote call behaviour
    #[serde(default)]
    pub service: ServiceFileConfig,

    /// Image text extraction
    #[serde(default)]
    pub ocr: OcrFileConfig,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerFileConfig,
}

/// Chat service configuration
#[derive(Debug, Default, Deserialize)]
pub struct ChatFileConfig {
    pub api_key: Option<String>,
    /// Model identifier (e.g. "gemini-1.5-flash")
    pub model: Option<String>,
    pub base_url: Option<String>,
}

/// News lookup configuration
#[derive(Debug, Default, Deserialize)]
pub struct NewsFileConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    /// Article language filter (e.g. "en")
    pub language: Option<String>,
    /// Cards rendered per lookup
    pub max_items: Option<usize>,
}

/// Speech output configuration
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    /// Enable speech output
    pub enabled: Option<bool>,

    /// Voice selected at startup (e.g. "en-US-AriaNeural")
    pub default_voice: Option<String>,

    /// Backend preference: "auto", "native", "network" or "none"
    pub backend: Option<String>,

    /// Base URL of an OpenAI-compatible speech endpoint
    pub tts_url: Option<String>,
    pub tts_api_key: Option<String>,
    pub tts_model: Option<String>,

    /// Delay between reveal start and speech start
    pub speech_delay_ms: Option<u64>,
}

/// Progressive reveal pacing
#[derive(Debug, Default, Deserialize)]
pub struct RevealFileConfig {
    /// Milliseconds between consecutive tokens
    pub interval_ms: Option<u64>,
}

/// Remote call behaviour
#[derive(Debug, Default, Deserialize)]
pub struct ServiceFileConfig {
    /// Upper bound on a chat or news call
    pub timeout_secs: Option<u64>,
}

/// Image text extraction
#[derive(Debug, Default, Deserialize)]
pub struct OcrFileConfig {
    pub url: Option<String>,
    /// Largest accepted upload in bytes
    pub max_bytes: Option<usize>,
}

/// HTTP server configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    pub port: Option<u16>,
    /// Directory served as the web UI
    pub static_dir: Option<String>,
}

/// Load the TOML config file from the standard path
///
/// Returns `AikyaConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> AikyaConfigFile {
    let Some(path) = config_file_path() else {
        return AikyaConfigFile::default();
    };

    if !path.exists() {
        return AikyaConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match parse_config(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                AikyaConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            AikyaConfigFile::default()
        }
    }
}

/// Parse config file contents
///
/// # Errors
///
/// Returns error if the content is not valid TOML for this schema
pub fn parse_config(content: &str) -> crate::Result<AikyaConfigFile> {
    Ok(toml::from_str(content)?)
}

/// Return the config file path
///
/// `AIKYA_CONFIG` overrides the default `~/.config/aikya/config.toml`.
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("AIKYA_CONFIG") {
        return Some(PathBuf::from(path));
    }
    directories::BaseDirs::new().map(|d| d.config_dir().join("aikya").join("config.toml"))
}
