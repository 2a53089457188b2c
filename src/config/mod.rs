//! Configuration management for Aikya
//!
//! Values resolve as environment variable > TOML file > built-in default.

pub mod file;

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::voice::BackendPreference;
use crate::{Error, Result};

use self::file::AikyaConfigFile;

/// Default Gemini-style endpoint for chat completions
pub const DEFAULT_CHAT_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default news lookup endpoint
pub const DEFAULT_NEWS_URL: &str = "https://newsdata.io/api/1/news";

/// Default OpenAI-compatible speech endpoint
pub const DEFAULT_TTS_URL: &str = "https://api.openai.com/v1";

/// Default image text extraction endpoint
pub const DEFAULT_OCR_URL: &str = "http://localhost:5000/extract-text";

/// Largest image accepted for text extraction (5 MiB)
pub const DEFAULT_OCR_MAX_BYTES: usize = 5 * 1024 * 1024;

/// Aikya configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Chat service configuration
    pub chat: ChatConfig,

    /// News lookup configuration
    pub news: NewsConfig,

    /// Speech output configuration
    pub voice: VoiceConfig,

    /// Pause between revealed tokens
    pub reveal_interval: Duration,

    /// Upper bound on a single chat or news call
    pub service_timeout: Duration,

    /// Image text extraction
    pub ocr: OcrConfig,

    /// HTTP API server configuration
    pub server: ServerConfig,
}

/// Chat service configuration
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// API key (from `GEMINI_API_KEY`)
    pub api_key: Option<SecretString>,

    /// Model identifier
    pub model: String,

    /// API base URL
    pub base_url: String,
}

/// News lookup configuration
#[derive(Debug, Clone)]
pub struct NewsConfig {
    /// API key (from `NEWSDATA_API_KEY`)
    pub api_key: Option<SecretString>,

    /// Endpoint answering `?apikey=&country=&language=`
    pub base_url: String,

    /// Article language filter
    pub language: String,

    /// Cards rendered per lookup
    pub max_items: usize,
}

/// Speech output configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Enable speech output
    pub enabled: bool,

    /// Voice selected at startup
    pub default_voice: String,

    /// Which synthesis backend to select at startup
    pub backend: BackendPreference,

    /// Base URL of the network speech endpoint
    pub tts_url: String,

    /// API key for the network speech endpoint
    pub tts_api_key: Option<SecretString>,

    /// Model for the network speech endpoint
    pub tts_model: String,

    /// Delay between reveal start and speech start
    pub speech_delay: Duration,
}

/// Image text extraction configuration
#[derive(Debug, Clone)]
pub struct OcrConfig {
    /// Upload endpoint
    pub url: String,

    /// Largest accepted image in bytes
    pub max_bytes: usize,
}

/// HTTP API server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,

    /// Path to static files directory (web UI)
    pub static_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chat: ChatConfig {
                api_key: None,
                model: "gemini-1.5-flash".to_string(),
                base_url: DEFAULT_CHAT_URL.to_string(),
            },
            news: NewsConfig {
                api_key: None,
                base_url: DEFAULT_NEWS_URL.to_string(),
                language: "en".to_string(),
                max_items: crate::news::MAX_NEWS_ITEMS,
            },
            voice: VoiceConfig {
                enabled: true,
                default_voice: crate::voice::DEFAULT_VOICE.to_string(),
                backend: BackendPreference::Auto,
                tts_url: DEFAULT_TTS_URL.to_string(),
                tts_api_key: None,
                tts_model: "tts-1".to_string(),
                speech_delay: Duration::from_millis(300),
            },
            reveal_interval: crate::reveal::DEFAULT_REVEAL_INTERVAL,
            service_timeout: Duration::from_secs(20),
            ocr: OcrConfig {
                url: DEFAULT_OCR_URL.to_string(),
                max_bytes: DEFAULT_OCR_MAX_BYTES,
            },
            server: ServerConfig {
                port: 8787,
                static_dir: None,
            },
        }
    }
}

impl Config {
    /// Load configuration from the environment and config file
    ///
    /// # Errors
    ///
    /// Returns error if a value is present but invalid
    pub fn load() -> Result<Self> {
        Self::load_with_options(false)
    }

    /// Load configuration with explicit voice disable option
    ///
    /// # Errors
    ///
    /// Returns error if a value is present but invalid
    pub fn load_with_options(disable_voice: bool) -> Result<Self> {
        let fc = file::load_config_file();
        let config = Self::from_sources(fc, |key| std::env::var(key).ok(), disable_voice)?;

        if disable_voice {
            tracing::info!("voice explicitly disabled via --disable-voice");
        }

        Ok(config)
    }

    /// Resolve configuration from a parsed file and an environment lookup
    ///
    /// # Errors
    ///
    /// Returns error if the speech backend preference is not recognized
    pub fn from_sources(
        fc: AikyaConfigFile,
        env: impl Fn(&str) -> Option<String>,
        disable_voice: bool,
    ) -> Result<Self> {
        let defaults = Self::default();
        let parse_u64 = |key: &str| env(key).and_then(|s| s.parse::<u64>().ok());

        // Chat (env > toml > default)
        let chat = ChatConfig {
            api_key: env("GEMINI_API_KEY")
                .or(fc.chat.api_key)
                .map(SecretString::from),
            model: env("AIKYA_CHAT_MODEL")
                .or(fc.chat.model)
                .unwrap_or(defaults.chat.model),
            base_url: env("AIKYA_CHAT_URL")
                .or(fc.chat.base_url)
                .unwrap_or(defaults.chat.base_url),
        };

        // News (env > toml > default)
        let news = NewsConfig {
            api_key: env("NEWSDATA_API_KEY")
                .or(fc.news.api_key)
                .map(SecretString::from),
            base_url: env("AIKYA_NEWS_URL")
                .or(fc.news.base_url)
                .unwrap_or(defaults.news.base_url),
            language: fc.news.language.unwrap_or(defaults.news.language),
            max_items: fc
                .news
                .max_items
                .filter(|n| *n > 0)
                .unwrap_or(defaults.news.max_items),
        };

        // Voice (env > toml > default)
        let backend = match env("AIKYA_TTS_BACKEND").or(fc.voice.backend) {
            Some(value) => value.parse::<BackendPreference>()?,
            None => defaults.voice.backend,
        };
        let voice = VoiceConfig {
            enabled: !disable_voice && fc.voice.enabled.unwrap_or(true),
            default_voice: env("AIKYA_VOICE")
                .or(fc.voice.default_voice)
                .unwrap_or(defaults.voice.default_voice),
            backend,
            tts_url: env("AIKYA_TTS_URL")
                .or(fc.voice.tts_url)
                .unwrap_or(defaults.voice.tts_url),
            tts_api_key: env("AIKYA_TTS_API_KEY")
                .or_else(|| env("OPENAI_API_KEY"))
                .or(fc.voice.tts_api_key)
                .map(SecretString::from),
            tts_model: fc.voice.tts_model.unwrap_or(defaults.voice.tts_model),
            speech_delay: fc
                .voice
                .speech_delay_ms
                .map_or(defaults.voice.speech_delay, Duration::from_millis),
        };

        let reveal_interval = parse_u64("AIKYA_REVEAL_INTERVAL_MS")
            .or(fc.reveal.interval_ms)
            .map_or(defaults.reveal_interval, Duration::from_millis);

        let service_timeout = parse_u64("AIKYA_SERVICE_TIMEOUT_SECS")
            .or(fc.service.timeout_secs)
            .filter(|s| *s > 0)
            .map_or(defaults.service_timeout, Duration::from_secs);

        let ocr = OcrConfig {
            url: env("AIKYA_OCR_URL")
                .or(fc.ocr.url)
                .unwrap_or(defaults.ocr.url),
            max_bytes: fc.ocr.max_bytes.unwrap_or(defaults.ocr.max_bytes),
        };

        // Server (env > toml > default)
        let server = ServerConfig {
            port: env("AIKYA_PORT")
                .or_else(|| env("PORT"))
                .and_then(|s| s.parse().ok())
                .or(fc.server.port)
                .unwrap_or(defaults.server.port),
            static_dir: env("AIKYA_STATIC_DIR")
                .or(fc.server.static_dir)
                .map(PathBuf::from),
        };

        if let Some(dir) = server.static_dir.as_ref().filter(|d| !d.is_dir()) {
            return Err(Error::Config(format!(
                "static directory does not exist: {}",
                dir.display()
            )));
        }

        Ok(Self {
            chat,
            news,
            voice,
            reveal_interval,
            service_timeout,
            ocr,
            server,
        })
    }
}
