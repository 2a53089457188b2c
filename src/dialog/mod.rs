//! Conversational turns
//!
//! The [`DialogOrchestrator`] is the single writer of [`DialogState`].

mod orchestrator;
mod prompts;
mod state;

pub use orchestrator::{DialogOrchestrator, DialogSnapshot, DialogTiming};
pub use prompts::{
    CHAT_ERROR_REPLY, GREETING_PROMPT, NEWS_TRIGGER, PromptCard, REGION_PROMPT, TIMEOUT_REPLY,
    card_prompt, is_news_trigger,
};
pub use state::{ConversationTurn, DialogMode, DialogState, TurnKind};
