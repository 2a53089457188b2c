//! Dialog state and conversation turns

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::format::FormattedResponse;

/// Where the dialog stands between prompts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogMode {
    /// Ready for a first prompt
    #[default]
    Idle,
    /// The next prompt names a news region
    AwaitingRegion,
    /// A remote call is in flight
    Processing,
    /// The last turn has been published
    Ready,
}

/// How a turn's response was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnKind {
    /// Chat service answer
    Chat,
    /// Fixed question asking for a news region
    RegionPrompt,
    /// News resolver output
    News,
    /// Fixed sentence standing in for a failed or timed-out call
    Failure,
}

/// One prompt/response exchange, immutable once built
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationTurn {
    /// Turn identifier
    pub id: Uuid,
    /// What produced the response
    pub kind: TurnKind,
    /// User-supplied prompt
    pub prompt_text: String,
    /// Raw response text before formatting
    pub response_text: String,
    /// Response markup as it reads once fully revealed
    pub response_markup: String,
    /// Markup-free response, as spoken
    pub plain_text: String,
    /// When the turn was built
    pub created_at: DateTime<Utc>,
}

impl ConversationTurn {
    /// Build a turn from a prompt and its formatted response
    #[must_use]
    pub fn new(
        kind: TurnKind,
        prompt_text: impl Into<String>,
        response_text: impl Into<String>,
        formatted: &FormattedResponse,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            prompt_text: prompt_text.into(),
            response_text: response_text.into(),
            response_markup: formatted.markup(),
            plain_text: formatted.plain_text(),
            created_at: Utc::now(),
        }
    }
}

/// State owned by the dialog orchestrator
///
/// `pending_news_prompt` is set exactly when `mode` is
/// [`DialogMode::AwaitingRegion`]; the transition methods keep it so.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DialogState {
    mode: DialogMode,
    pending_news_prompt: Option<String>,
    current_turn: Option<ConversationTurn>,
}

impl DialogState {
    /// Current mode
    #[must_use]
    pub const fn mode(&self) -> DialogMode {
        self.mode
    }

    /// Card prompt that opened the pending news request
    #[must_use]
    pub fn pending_news_prompt(&self) -> Option<&str> {
        self.pending_news_prompt.as_deref()
    }

    /// Most recently published turn
    #[must_use]
    pub const fn current_turn(&self) -> Option<&ConversationTurn> {
        self.current_turn.as_ref()
    }

    /// Wait for a region name after `trigger`
    pub fn await_region(&mut self, trigger: &str) {
        self.mode = DialogMode::AwaitingRegion;
        self.pending_news_prompt = Some(trigger.to_string());
    }

    /// Leave the region wait, returning the prompt that opened it
    pub fn take_pending_news_prompt(&mut self) -> Option<String> {
        let pending = self.pending_news_prompt.take();
        if self.mode == DialogMode::AwaitingRegion {
            self.mode = DialogMode::Processing;
        }
        pending
    }

    /// A remote call has started
    pub fn begin_processing(&mut self) {
        self.mode = DialogMode::Processing;
        self.pending_news_prompt = None;
    }

    /// Publish `turn`; a region prompt keeps the region wait open
    pub fn publish(&mut self, turn: ConversationTurn) {
        if turn.kind != TurnKind::RegionPrompt {
            self.mode = DialogMode::Ready;
            self.pending_news_prompt = None;
        }
        self.current_turn = Some(turn);
    }

    /// Back to idle with no turn
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::format_response;

    fn turn(kind: TurnKind, response: &str) -> ConversationTurn {
        ConversationTurn::new(kind, "prompt", response, &format_response(response))
    }

    #[test]
    fn pending_prompt_follows_region_wait() {
        let mut state = DialogState::default();
        state.await_region("Show me current news about it");
        assert_eq!(state.mode(), DialogMode::AwaitingRegion);
        assert!(state.pending_news_prompt().is_some());

        state.publish(turn(TurnKind::RegionPrompt, "Which region?"));
        assert_eq!(state.mode(), DialogMode::AwaitingRegion);
        assert!(state.pending_news_prompt().is_some());

        assert!(state.take_pending_news_prompt().is_some());
        assert_eq!(state.mode(), DialogMode::Processing);
        assert!(state.pending_news_prompt().is_none());

        state.publish(turn(TurnKind::News, "<h3>News</h3>"));
        assert_eq!(state.mode(), DialogMode::Ready);
    }

    #[test]
    fn reset_clears_everything() {
        let mut state = DialogState::default();
        state.await_region("trigger");
        state.publish(turn(TurnKind::RegionPrompt, "Which region?"));
        state.reset();

        assert_eq!(state.mode(), DialogMode::Idle);
        assert!(state.pending_news_prompt().is_none());
        assert!(state.current_turn().is_none());
    }

    #[test]
    fn turn_keeps_markup_and_plain_text() {
        let t = turn(TurnKind::Chat, "**Hi** there");
        assert_eq!(t.response_markup, "<b>Hi</b> there ");
        assert_eq!(t.plain_text, "Hi there");
        assert_eq!(t.response_text, "**Hi** there");
    }
}
