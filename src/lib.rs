//! Aikya - conversational assistant core
//!
//! This library owns everything between a submitted prompt and what the
//! user sees and hears:
//! - Dialog turns, including the two-step news flow
//! - Response formatting and progressive reveal
//! - Speech output with mute, stop and replay
//! - News lookup by region, chat completion, image text extraction
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │               View layer (HTTP API / CLI)            │
//! └────────────────────┬────────────────────────────────┘
//!                      │ submit / newConversation / replay
//! ┌────────────────────▼────────────────────────────────┐
//! │                DialogOrchestrator                    │
//! │   ResponseFormatter │ RevealScheduler │ Speech       │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │     Chat service  │  News service  │  OCR service    │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod chat;
pub mod config;
pub mod dialog;
pub mod error;
pub mod format;
pub mod news;
pub mod ocr;
pub mod reveal;
pub mod voice;

pub use chat::{ChatService, GeminiClient};
pub use config::Config;
pub use dialog::{ConversationTurn, DialogMode, DialogOrchestrator, DialogTiming, PromptCard};
pub use error::{Error, Result};
pub use format::{FormattedResponse, format_response, to_plain_text};
pub use news::{NewsArticle, NewsRegionResolver, NewsService};
pub use ocr::{OcrClient, OcrError};
pub use reveal::{RevealHandle, RevealScheduler};
pub use voice::{SpeechBackend, SpeechController, SpeechSession, SpeechStatus, VoiceCatalog};
