//! Turn orchestration
//!
//! [`DialogOrchestrator::submit`] decides what a prompt means, calls at
//! most one remote service, then publishes the turn: the reveal starts at
//! once and speech follows after a short delay. The two run independently.
//!
//! Submits are last-wins. Every submit and every
//! [`DialogOrchestrator::new_conversation`] bumps an epoch; a turn whose
//! remote call finishes after the epoch moved on is returned to its caller
//! but never published.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use super::prompts::{CHAT_ERROR_REPLY, REGION_PROMPT, TIMEOUT_REPLY, card_prompt, is_news_trigger};
use super::state::{ConversationTurn, DialogMode, DialogState, TurnKind};
use crate::chat::{ChatService, GeminiClient};
use crate::config::Config;
use crate::format::format_response;
use crate::news::{NewsDataClient, NewsRegionResolver};
use crate::reveal::RevealScheduler;
use crate::voice::{SpeechController, SpeechSession};

/// Timing knobs for the orchestrator
#[derive(Debug, Clone, Copy)]
pub struct DialogTiming {
    /// Pause between revealed tokens
    pub reveal_interval: Duration,
    /// Upper bound on a chat or news call
    pub service_timeout: Duration,
    /// Delay between reveal start and speech start
    pub speech_delay: Duration,
}

impl DialogTiming {
    /// Timing from configuration
    #[must_use]
    pub const fn from_config(config: &Config) -> Self {
        Self {
            reveal_interval: config.reveal_interval,
            service_timeout: config.service_timeout,
            speech_delay: config.voice.speech_delay,
        }
    }
}

impl Default for DialogTiming {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// What a submitted prompt asks for
#[derive(Debug)]
enum TurnPlan {
    RegionPrompt,
    News,
    Chat,
}

#[derive(Debug, Default)]
struct Inner {
    state: DialogState,
    epoch: u64,
    history: Vec<ConversationTurn>,
    pending_speech: Option<CancellationToken>,
}

impl Inner {
    fn cancel_pending_speech(&mut self) {
        if let Some(token) = self.pending_speech.take() {
            token.cancel();
        }
    }
}

/// Everything the view layer reads about the dialog
#[derive(Debug, Clone, serde::Serialize)]
pub struct DialogSnapshot {
    /// Current mode
    pub mode: DialogMode,
    /// Card prompt awaiting a region
    pub pending_news_prompt: Option<String>,
    /// Most recent published turn
    pub current_turn: Option<ConversationTurn>,
    /// Display buffer as revealed so far
    pub display: String,
    /// Published turns, oldest first
    pub history: Vec<ConversationTurn>,
}

/// Owns the dialog state and drives formatting, reveal and speech
pub struct DialogOrchestrator {
    chat: Arc<dyn ChatService>,
    news: NewsRegionResolver,
    reveal: RevealScheduler,
    speech: Arc<SpeechController>,
    timing: DialogTiming,
    inner: Mutex<Inner>,
}

impl DialogOrchestrator {
    /// Create an orchestrator over its collaborators
    #[must_use]
    pub fn new(
        chat: Arc<dyn ChatService>,
        news: NewsRegionResolver,
        speech: Arc<SpeechController>,
        timing: DialogTiming,
    ) -> Self {
        Self {
            chat,
            news,
            reveal: RevealScheduler::new(timing.reveal_interval),
            speech,
            timing,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Create an orchestrator with the HTTP clients and speech backend
    /// named by `config`
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let chat = Arc::new(GeminiClient::new(&config.chat));
        let news = NewsRegionResolver::new(
            Arc::new(NewsDataClient::new(&config.news)),
            config.news.max_items,
        );
        let speech = Arc::new(SpeechController::from_config(&config.voice));
        Self::new(chat, news, speech, DialogTiming::from_config(config))
    }

    /// Submit one prompt and wait for its turn
    ///
    /// Never fails: service errors and timeouts become fixed sentences.
    /// Must be called from within a tokio runtime.
    pub async fn submit(&self, prompt: &str) -> ConversationTurn {
        let (epoch, plan) = self.begin_turn(prompt);
        tracing::info!(epoch, plan = ?plan, "turn submitted");

        let (kind, response) = match plan {
            TurnPlan::RegionPrompt => (TurnKind::RegionPrompt, REGION_PROMPT.to_string()),
            TurnPlan::News => self.fetch_news(prompt).await,
            TurnPlan::Chat => self.fetch_chat(prompt).await,
        };

        let formatted = format_response(&response);
        let turn = ConversationTurn::new(kind, prompt, response, &formatted);

        let mut inner = self.lock();
        if inner.epoch != epoch {
            tracing::debug!(epoch, latest = inner.epoch, "turn superseded, not published");
            return turn;
        }

        inner.state.publish(turn.clone());
        inner.history.push(turn.clone());
        self.reveal.reveal(formatted.into_tokens());
        self.schedule_speech(&mut inner, turn.plain_text.clone());
        drop(inner);

        tracing::info!(epoch, kind = ?turn.kind, "turn published");
        turn
    }

    /// Submit the prompt for a quick-action card
    pub async fn submit_card(&self, card: &str) -> ConversationTurn {
        self.submit(card_prompt(card)).await
    }

    /// Drop the live turn and return to idle
    ///
    /// Stops speech, clears the display and any pending region request.
    /// History is kept.
    pub async fn new_conversation(&self) {
        {
            let mut inner = self.lock();
            inner.epoch += 1;
            inner.state.reset();
            inner.cancel_pending_speech();
            self.reveal.reset();
        }
        self.speech.stop().await;
        tracing::info!("new conversation");
    }

    /// Speak the current turn again with the selected voice
    pub async fn replay(&self) -> Option<SpeechSession> {
        let text = self.lock().state.current_turn()?.plain_text.clone();
        let voice = self.speech.selected_voice();
        self.speech.replay(&text, &voice).await
    }

    /// Current mode
    #[must_use]
    pub fn mode(&self) -> DialogMode {
        self.lock().state.mode()
    }

    /// Card prompt awaiting a region
    #[must_use]
    pub fn pending_news_prompt(&self) -> Option<String> {
        self.lock().state.pending_news_prompt().map(ToString::to_string)
    }

    /// Most recently published turn
    #[must_use]
    pub fn current_turn(&self) -> Option<ConversationTurn> {
        self.lock().state.current_turn().cloned()
    }

    /// Published turns, oldest first
    #[must_use]
    pub fn history(&self) -> Vec<ConversationTurn> {
        self.lock().history.clone()
    }

    /// Display buffer as revealed so far
    #[must_use]
    pub fn display(&self) -> String {
        self.reveal.snapshot()
    }

    /// Watch the display buffer
    #[must_use]
    pub fn subscribe_display(&self) -> watch::Receiver<String> {
        self.reveal.subscribe()
    }

    /// Whether the current turn is still being revealed
    #[must_use]
    pub fn is_revealing(&self) -> bool {
        self.reveal.is_revealing()
    }

    /// Speech controller shared with the view layer
    #[must_use]
    pub const fn speech(&self) -> &Arc<SpeechController> {
        &self.speech
    }

    /// Timing in effect
    #[must_use]
    pub const fn timing(&self) -> DialogTiming {
        self.timing
    }

    /// Everything the view layer reads, taken under one lock
    #[must_use]
    pub fn snapshot(&self) -> DialogSnapshot {
        let inner = self.lock();
        DialogSnapshot {
            mode: inner.state.mode(),
            pending_news_prompt: inner.state.pending_news_prompt().map(ToString::to_string),
            current_turn: inner.state.current_turn().cloned(),
            display: self.reveal.snapshot(),
            history: inner.history.clone(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Bump the epoch and move the state machine for `prompt`
    ///
    /// A region wait is checked first, so a trigger phrase typed while
    /// waiting is taken as a region name.
    fn begin_turn(&self, prompt: &str) -> (u64, TurnPlan) {
        let mut inner = self.lock();
        inner.epoch += 1;
        inner.cancel_pending_speech();

        let plan = if inner.state.mode() == DialogMode::AwaitingRegion {
            inner.state.take_pending_news_prompt();
            TurnPlan::News
        } else if is_news_trigger(prompt) {
            inner.state.await_region(prompt);
            TurnPlan::RegionPrompt
        } else {
            inner.state.begin_processing();
            TurnPlan::Chat
        };

        (inner.epoch, plan)
    }

    async fn fetch_chat(&self, prompt: &str) -> (TurnKind, String) {
        match tokio::time::timeout(self.timing.service_timeout, self.chat.complete(prompt)).await {
            Ok(Ok(text)) => (TurnKind::Chat, text),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "chat request failed");
                (TurnKind::Failure, CHAT_ERROR_REPLY.to_string())
            }
            Err(_) => {
                tracing::warn!(timeout = ?self.timing.service_timeout, "chat request timed out");
                (TurnKind::Failure, TIMEOUT_REPLY.to_string())
            }
        }
    }

    async fn fetch_news(&self, region: &str) -> (TurnKind, String) {
        match tokio::time::timeout(self.timing.service_timeout, self.news.resolve(region)).await {
            Ok(markup) => (TurnKind::News, markup),
            Err(_) => {
                tracing::warn!(timeout = ?self.timing.service_timeout, "news request timed out");
                (TurnKind::Failure, TIMEOUT_REPLY.to_string())
            }
        }
    }

    /// Start speech for a published turn after the configured delay
    fn schedule_speech(&self, inner: &mut Inner, text: String) {
        inner.cancel_pending_speech();
        if !self.speech.tts_available() || self.speech.is_muted() {
            return;
        }

        let token = CancellationToken::new();
        inner.pending_speech = Some(token.clone());

        let speech = Arc::clone(&self.speech);
        let delay = self.timing.speech_delay;
        tokio::spawn(async move {
            tokio::select! {
                () = token.cancelled() => {
                    tracing::trace!("delayed speech cancelled");
                }
                () = tokio::time::sleep(delay) => {
                    let voice = speech.selected_voice();
                    speech.speak_guarded(&text, &voice, &token).await;
                }
            }
        });
    }
}

impl std::fmt::Debug for DialogOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialogOrchestrator")
            .field("mode", &self.mode())
            .field("timing", &self.timing)
            .field("speech", &self.speech)
            .finish_non_exhaustive()
    }
}
